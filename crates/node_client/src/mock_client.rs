//! Mock flow-list client
//!
//! Scripted per-organization outcomes plus a record of every request, for tests
//! and dry runs without a node.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use contracts::{FlowListClient, FlowListOutcome, FlowListRequest, FlowListing, FlowRecord};
use tracing::instrument;

#[derive(Debug, Default)]
struct Script {
    /// Consumed front to back before `fixed` is consulted
    once: HashMap<String, VecDeque<FlowListOutcome>>,
    fixed: HashMap<String, FlowListOutcome>,
}

/// Mock flow-list client
///
/// Unscripted organizations get the default outcome (an empty listing unless
/// configured otherwise).
#[derive(Debug)]
pub struct MockFlowListClient {
    default_outcome: FlowListOutcome,
    script: Mutex<Script>,
    calls: Mutex<Vec<FlowListRequest>>,
    latency: Duration,
}

impl MockFlowListClient {
    pub fn new() -> Self {
        Self::with_default(FlowListOutcome::Success(FlowListing::default()))
    }

    pub fn with_default(default_outcome: FlowListOutcome) -> Self {
        Self {
            default_outcome,
            script: Mutex::new(Script::default()),
            calls: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    /// Simulated round-trip time
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Always answer `outcome` for this organization
    pub fn respond(self, organization_id: impl Into<String>, outcome: FlowListOutcome) -> Self {
        self.lock_script().fixed.insert(organization_id.into(), outcome);
        self
    }

    /// Answer `outcome` once for this organization, ahead of any fixed outcome
    pub fn respond_once(
        self,
        organization_id: impl Into<String>,
        outcome: FlowListOutcome,
    ) -> Self {
        self.lock_script()
            .once
            .entry(organization_id.into())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Shorthand for a successful listing of the given flow ids
    pub fn respond_flows(self, organization_id: impl Into<String>, flow_ids: &[&str]) -> Self {
        let flows = flow_ids
            .iter()
            .map(|id| FlowRecord {
                flow_id: (*id).to_string(),
                flow_timestamp: None,
            })
            .collect();
        self.respond(organization_id, FlowListOutcome::Success(FlowListing::new(flows)))
    }

    /// Every request received, in call order
    pub fn calls(&self) -> Vec<FlowListRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn calls_for(&self, organization_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.organization_id == organization_id)
            .count()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_outcome(&self, organization_id: &str) -> FlowListOutcome {
        let mut script = self.lock_script();
        if let Some(outcome) = script
            .once
            .get_mut(organization_id)
            .and_then(VecDeque::pop_front)
        {
            return outcome;
        }
        script
            .fixed
            .get(organization_id)
            .cloned()
            .unwrap_or_else(|| self.default_outcome.clone())
    }
}

impl Default for MockFlowListClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowListClient for MockFlowListClient {
    #[instrument(
        name = "mock_fetch_flow_list",
        skip(self, request),
        fields(organization_id = %request.organization_id)
    )]
    async fn fetch_flow_list(&self, request: &FlowListRequest) -> FlowListOutcome {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.next_outcome(&request.organization_id)
    }
}
