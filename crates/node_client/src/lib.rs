//! # Node Client
//!
//! Remote reporting-flow list adapters.
//!
//! - `HttpFlowListClient`: JSON gateway in front of the payment node
//! - `MockFlowListClient`: scripted outcomes with call recording, for tests and dry runs

pub mod client;
pub mod error;
pub mod mock_client;
pub mod wire;

pub use client::HttpFlowListClient;
pub use contracts::{FlowListClient, FlowListOutcome, FlowListRequest};
pub use error::NodeClientError;
pub use mock_client::MockFlowListClient;
