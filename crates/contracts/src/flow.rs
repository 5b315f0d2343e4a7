//! Remote reporting-flow RPC contract
//!
//! The RPC result is a single tagged value, inspected by the dispatcher to decide
//! between handoff, requeue and drop.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Request for the flow list of one organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowListRequest {
    pub organization_id: String,
    pub broker_code: String,
    pub station_code: String,
    /// Station password, when the remote service requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// One reporting flow reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub flow_id: String,
    #[serde(default)]
    pub flow_timestamp: Option<NaiveDateTime>,
}

/// Successful flow list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowListing {
    /// Total count reported by the service
    pub total: u32,
    pub flows: Vec<FlowRecord>,
}

impl FlowListing {
    pub fn new(flows: Vec<FlowRecord>) -> Self {
        let total = u32::try_from(flows.len()).unwrap_or(u32::MAX);
        Self { total, flows }
    }

    /// Flow identifiers, in service order
    pub fn flow_ids(&self) -> Vec<String> {
        self.flows.iter().map(|f| f.flow_id.clone()).collect()
    }
}

/// Result of one remote flow-list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowListOutcome {
    /// Non-fault payload, possibly with zero flows
    Success(FlowListing),
    /// Fault payload returned by the service (terminal)
    BusinessFault(String),
    /// Service unreachable (eligible for requeue)
    TransportError(String),
}

impl FlowListOutcome {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::BusinessFault(_) => "business_fault",
            Self::TransportError(_) => "transport_error",
        }
    }
}

/// Remote reporting-flow client
#[trait_variant::make(FlowListClient: Send)]
pub trait LocalFlowListClient {
    /// Fetch the flow list for one organization
    ///
    /// Never fails out of band: every failure is folded into the outcome.
    async fn fetch_flow_list(&self, request: &FlowListRequest) -> FlowListOutcome;
}
