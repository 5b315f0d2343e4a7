//! # Dispatcher
//!
//! Batch orchestration.
//!
//! Responsibilities:
//! - Decode one organization batch per invocation
//! - Resolve routing from the shared `ConfigCache` snapshot
//! - Call the remote flow-list service per organization
//! - Hand successes downstream, requeue transport failures within the retry budget

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod processors;
pub mod queues;
pub mod resolver;
pub mod retry;

pub use contracts::{FlowProcessor, RetryQueue};
pub use dispatcher::{BatchDispatcher, InvocationReport, OrganizationOutcome, OrganizationReport};
pub use error::DispatchError;
pub use metrics::{DispatchMetrics, DispatchSnapshot};
pub use processors::{FileFlowProcessor, LogFlowProcessor, MemoryFlowProcessor};
pub use queues::{FileQueue, MemoryQueue};
pub use resolver::StationResolver;
pub use retry::{RequeueOutcome, RetryScheduler};
