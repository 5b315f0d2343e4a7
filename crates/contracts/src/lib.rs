//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the worker.
//! Business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Boundaries
//! - `ConfigProvider`: remote routing configuration (organization -> station -> broker)
//! - `FlowListClient`: remote reporting-flow RPC
//! - `RetryQueue`: re-delivery of single-organization batches
//! - `FlowProcessor`: downstream handoff of retrieved flow identifiers

mod batch;
mod clock;
mod error;
mod flow;
mod processor;
mod provider;
mod queue;
mod settings;
mod snapshot;

pub use batch::*;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::*;
pub use flow::*;
pub use processor::*;
pub use provider::*;
pub use queue::*;
pub use settings::*;
pub use snapshot::*;
