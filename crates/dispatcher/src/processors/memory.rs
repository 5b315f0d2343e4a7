//! MemoryFlowProcessor - records handoffs in memory

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use contracts::{ContractError, FlowHandoff, FlowProcessor};

/// Processor that keeps every handoff, optionally failing for chosen organizations
#[derive(Debug)]
pub struct MemoryFlowProcessor {
    name: String,
    handoffs: Mutex<Vec<FlowHandoff>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryFlowProcessor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handoffs: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Reject handoffs for this organization
    pub fn fail_for(&self, organization_id: impl Into<String>) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(organization_id.into());
    }

    /// Accepted handoffs, in arrival order
    pub fn handoffs(&self) -> Vec<FlowHandoff> {
        self.handoffs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn handoff_count(&self) -> usize {
        self.handoffs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl FlowProcessor for MemoryFlowProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, handoff: &FlowHandoff) -> Result<(), ContractError> {
        let rejected = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&handoff.organization_id);
        if rejected {
            return Err(ContractError::handoff(
                &self.name,
                &handoff.organization_id,
                "rejected",
            ));
        }

        self.handoffs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handoff.clone());
        Ok(())
    }
}
