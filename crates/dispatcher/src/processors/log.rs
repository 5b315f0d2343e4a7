//! LogFlowProcessor - logs handoffs via tracing

use contracts::{ContractError, FlowHandoff, FlowProcessor};
use tracing::{info, instrument};

/// Processor that only logs what it receives
pub struct LogFlowProcessor {
    name: String,
}

impl LogFlowProcessor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl FlowProcessor for LogFlowProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_processor_process",
        skip(self, handoff),
        fields(processor = %self.name, organization_id = %handoff.organization_id)
    )]
    async fn process(&self, handoff: &FlowHandoff) -> Result<(), ContractError> {
        info!(
            flows = handoff.flow_ids.len(),
            flow_ids = ?handoff.flow_ids,
            "Flows retrieved"
        );
        Ok(())
    }
}
