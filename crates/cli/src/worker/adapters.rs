//! Runtime-selected boundary adapters
//!
//! The dispatcher is generic over its collaborators; these enums let the
//! binary pick an implementation from the command line.

use contracts::{
    ContractError, FlowHandoff, FlowListClient, FlowListOutcome, FlowListRequest, FlowProcessor,
};
use dispatcher::{FileFlowProcessor, LogFlowProcessor};
use node_client::{HttpFlowListClient, MockFlowListClient};

pub enum NodeAdapter {
    Http(HttpFlowListClient),
    Mock(MockFlowListClient),
}

impl FlowListClient for NodeAdapter {
    async fn fetch_flow_list(&self, request: &FlowListRequest) -> FlowListOutcome {
        match self {
            Self::Http(client) => client.fetch_flow_list(request).await,
            Self::Mock(client) => client.fetch_flow_list(request).await,
        }
    }
}

pub enum ProcessorAdapter {
    File(FileFlowProcessor),
    Log(LogFlowProcessor),
}

impl FlowProcessor for ProcessorAdapter {
    fn name(&self) -> &str {
        match self {
            Self::File(processor) => processor.name(),
            Self::Log(processor) => processor.name(),
        }
    }

    async fn process(&self, handoff: &FlowHandoff) -> Result<(), ContractError> {
        match self {
            Self::File(processor) => processor.process(handoff).await,
            Self::Log(processor) => processor.process(handoff).await,
        }
    }
}
