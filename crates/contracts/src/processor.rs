//! FlowProcessor trait - downstream handoff interface

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Flow identifiers retrieved for one organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowHandoff {
    #[serde(rename = "idPA")]
    pub organization_id: String,
    #[serde(rename = "flowIds")]
    pub flow_ids: Vec<String>,
}

/// Downstream flow processor
///
/// Failures are reported to the caller, which logs them; retrying is the
/// processor's own responsibility.
#[trait_variant::make(FlowProcessor: Send)]
pub trait LocalFlowProcessor {
    /// Processor name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Hand over the flows of one organization
    async fn process(&self, handoff: &FlowHandoff) -> Result<(), ContractError>;
}
