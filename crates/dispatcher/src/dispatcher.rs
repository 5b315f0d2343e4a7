//! BatchDispatcher - one invocation per inbound batch message
//!
//! Decode, fetch the routing snapshot, then drive every organization through
//! resolve -> remote call -> {handoff | requeue | drop} independently.

use std::sync::Arc;
use std::time::Instant;

use config_cache::ConfigCache;
use contracts::{
    ConfigProvider, ConfigSnapshot, FlowHandoff, FlowListClient, FlowListOutcome,
    FlowListRequest, FlowProcessor, OrganizationBatch, RetryQueue,
};
use tracing::{error, info, instrument, warn};

use crate::error::DispatchError;
use crate::metrics::DispatchMetrics;
use crate::resolver::StationResolver;
use crate::retry::{RequeueOutcome, RetryScheduler};

/// Terminal state of one organization within an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationOutcome {
    /// Flows handed to the processor (possibly zero)
    HandedOff { flow_count: usize },
    /// No enabled station linked to the organization
    Unresolved,
    /// The remote service answered with a fault
    BusinessFault { description: String },
    /// Remote service unreachable, requeued with this retry counter
    Requeued { retry: u32 },
    /// Remote service unreachable and the retry budget is spent
    RetryExhausted { retry: u32 },
    /// Processor rejected the handoff
    HandoffFailed { message: String },
    /// Requeue publish failed
    RequeueFailed { message: String },
}

impl OrganizationOutcome {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::HandedOff { .. } => "handed_off",
            Self::Unresolved => "unresolved",
            Self::BusinessFault { .. } => "business_fault",
            Self::Requeued { .. } => "requeued",
            Self::RetryExhausted { .. } => "retry_exhausted",
            Self::HandoffFailed { .. } => "handoff_failed",
            Self::RequeueFailed { .. } => "requeue_failed",
        }
    }
}

/// Per-organization entry of an `InvocationReport`
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationReport {
    pub organization_id: String,
    pub outcome: OrganizationOutcome,
    /// Remote call latency, when a call was made
    pub rpc_latency_ms: Option<f64>,
}

/// Outcome of one successful invocation, in batch order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationReport {
    /// Retry counter of the inbound batch
    pub retry: u32,
    pub organizations: Vec<OrganizationReport>,
}

impl InvocationReport {
    pub fn len(&self) -> usize {
        self.organizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
    }

    /// Number of organizations with the given outcome label
    pub fn count(&self, label: &str) -> usize {
        self.organizations
            .iter()
            .filter(|report| report.outcome.label() == label)
            .count()
    }

    pub fn outcome_of(&self, organization_id: &str) -> Option<&OrganizationOutcome> {
        self.organizations
            .iter()
            .find(|report| report.organization_id == organization_id)
            .map(|report| &report.outcome)
    }
}

/// Per-invocation orchestrator
///
/// Shared across concurrent invocations; each call to `dispatch` owns its batch.
pub struct BatchDispatcher<P, C, Q, F> {
    cache: Arc<ConfigCache<P>>,
    client: C,
    scheduler: RetryScheduler<Q>,
    processor: F,
    station_password: Option<String>,
    metrics: Arc<DispatchMetrics>,
}

impl<P, C, Q, F> BatchDispatcher<P, C, Q, F>
where
    P: ConfigProvider + Sync,
    C: FlowListClient + Sync,
    Q: RetryQueue + Sync,
    F: FlowProcessor + Sync,
{
    pub fn new(
        cache: Arc<ConfigCache<P>>,
        client: C,
        scheduler: RetryScheduler<Q>,
        processor: F,
    ) -> Self {
        Self {
            cache,
            client,
            scheduler,
            processor,
            station_password: None,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    /// Password sent with every remote call
    pub fn with_station_password(mut self, password: Option<String>) -> Self {
        self.station_password = password;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    pub fn cache(&self) -> &Arc<ConfigCache<P>> {
        &self.cache
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn scheduler(&self) -> &RetryScheduler<Q> {
        &self.scheduler
    }

    pub fn processor(&self) -> &F {
        &self.processor
    }

    /// Process one raw inbound message
    ///
    /// # Errors
    /// - `MessageDecode`: the message is dropped, nothing else happens
    /// - `Cache`: the configuration provider is unreachable, the invocation is aborted
    #[instrument(name = "dispatcher_dispatch", skip(self, message))]
    pub async fn dispatch(&self, message: &str) -> Result<InvocationReport, DispatchError> {
        self.metrics.inc_invocations();

        let batch = match OrganizationBatch::decode(message) {
            Ok(batch) => batch,
            Err(e) => {
                error!(error = %e, "Message dropped");
                return Err(self.fail(DispatchError::MessageDecode(e)));
            }
        };

        info!(
            organizations = batch.len(),
            retry = batch.retry,
            "Processing organization batch"
        );

        let snapshot = self
            .cache
            .get()
            .await
            .map_err(|e| self.fail(DispatchError::Cache(e)))?;

        let mut report = InvocationReport {
            retry: batch.retry,
            organizations: Vec::with_capacity(batch.len()),
        };
        for organization_id in &batch.organization_ids {
            let entry = self
                .process_organization(&snapshot, organization_id, batch.retry)
                .await;
            self.metrics.record(&entry.outcome);
            observability::record_organization_outcome(entry.outcome.label());
            report.organizations.push(entry);
        }

        observability::record_invocation("completed");
        info!(
            organizations = report.len(),
            handed_off = report.count("handed_off"),
            requeued = report.count("requeued"),
            "Batch processed"
        );
        Ok(report)
    }

    fn fail(&self, err: DispatchError) -> DispatchError {
        if err.is_fatal() {
            self.metrics.inc_fatal_failures();
        } else {
            self.metrics.inc_decode_failures();
        }
        observability::record_invocation(err.status());
        err
    }

    #[instrument(name = "dispatcher_organization", skip(self, snapshot))]
    async fn process_organization(
        &self,
        snapshot: &ConfigSnapshot,
        organization_id: &str,
        retry: u32,
    ) -> OrganizationReport {
        let report = |outcome, rpc_latency_ms| OrganizationReport {
            organization_id: organization_id.to_string(),
            outcome,
            rpc_latency_ms,
        };

        let Some(routing) = StationResolver::resolve(snapshot, organization_id) else {
            warn!("No enabled station configured for organization");
            return report(OrganizationOutcome::Unresolved, None);
        };

        info!(
            broker = %routing.broker_code,
            station = %routing.station_code,
            "Requesting flow list"
        );
        let request = FlowListRequest {
            organization_id: organization_id.to_string(),
            broker_code: routing.broker_code,
            station_code: routing.station_code,
            password: self.station_password.clone(),
        };

        let started = Instant::now();
        let outcome = self.client.fetch_flow_list(&request).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        observability::record_rpc_latency_ms(latency_ms);

        let outcome = match outcome {
            FlowListOutcome::Success(listing) => {
                info!(total = listing.total, "Flow list retrieved");
                let handoff = FlowHandoff {
                    organization_id: organization_id.to_string(),
                    flow_ids: listing.flow_ids(),
                };
                match self.processor.process(&handoff).await {
                    Ok(()) => OrganizationOutcome::HandedOff {
                        flow_count: handoff.flow_ids.len(),
                    },
                    Err(e) => {
                        error!(processor = self.processor.name(), error = %e, "Handoff failed");
                        OrganizationOutcome::HandoffFailed {
                            message: e.to_string(),
                        }
                    }
                }
            }
            FlowListOutcome::BusinessFault(description) => {
                warn!(fault = %description, "Remote service returned a fault");
                OrganizationOutcome::BusinessFault { description }
            }
            FlowListOutcome::TransportError(cause) => {
                error!(cause = %cause, "Remote service unreachable");
                match self
                    .scheduler
                    .requeue(organization_id, retry.saturating_add(1))
                    .await
                {
                    Ok(RequeueOutcome::Published { retry }) => OrganizationOutcome::Requeued { retry },
                    Ok(RequeueOutcome::Dropped { retry }) => {
                        OrganizationOutcome::RetryExhausted { retry }
                    }
                    Err(e) => {
                        error!(error = %e, "Requeue failed");
                        OrganizationOutcome::RequeueFailed {
                            message: e.to_string(),
                        }
                    }
                }
            }
        };

        report(outcome, Some(latency_ms))
    }
}
