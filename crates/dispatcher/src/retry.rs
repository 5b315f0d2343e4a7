//! RetryScheduler - bounded requeue of single organizations

use contracts::{ContractError, OrganizationBatch, QueueMessage, RetryQueue, RetrySettings};
use tracing::{error, info, instrument};

/// Result of a requeue request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequeueOutcome {
    /// Message published with this retry counter
    Published { retry: u32 },
    /// Retry counter would exceed the maximum; nothing published
    Dropped { retry: u32 },
}

/// Publishes `{idPA: [organization], retry}` with the configured TTL and
/// visibility delay, while `retry <= max_retry`
pub struct RetryScheduler<Q> {
    queue: Q,
    max_retry: u32,
    time_to_live_secs: u64,
    visibility_delay_secs: u64,
}

impl<Q: RetryQueue + Sync> RetryScheduler<Q> {
    pub fn new(queue: Q, settings: &RetrySettings) -> Self {
        Self {
            queue,
            max_retry: settings.max_retry,
            time_to_live_secs: settings.message_ttl_secs,
            visibility_delay_secs: settings.initial_visibility_delay_secs,
        }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn max_retry(&self) -> u32 {
        self.max_retry
    }

    /// Requeue one organization with `next_retry`
    ///
    /// # Errors
    /// Propagates the queue's publish failure.
    #[instrument(
        name = "retry_scheduler_requeue",
        skip(self),
        fields(queue = self.queue.name(), max_retry = self.max_retry)
    )]
    pub async fn requeue(
        &self,
        organization_id: &str,
        next_retry: u32,
    ) -> Result<RequeueOutcome, ContractError> {
        if next_retry > self.max_retry {
            error!(organization_id, retry = next_retry, "Max retry exceeded");
            return Ok(RequeueOutcome::Dropped { retry: next_retry });
        }

        let message = QueueMessage {
            body: OrganizationBatch::single(organization_id, next_retry),
            time_to_live_secs: self.time_to_live_secs,
            visibility_delay_secs: self.visibility_delay_secs,
        };
        self.queue.publish(&message).await?;

        info!(
            organization_id,
            retry = next_retry,
            delay_secs = self.visibility_delay_secs,
            "Organization requeued"
        );
        Ok(RequeueOutcome::Published { retry: next_retry })
    }
}
