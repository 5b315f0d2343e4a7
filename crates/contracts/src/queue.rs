//! RetryQueue trait - re-delivery transport

use crate::{ContractError, QueueMessage};

/// Queue that accepts re-delivery messages
#[trait_variant::make(RetryQueue: Send)]
pub trait LocalRetryQueue {
    /// Queue name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Publish one message with its TTL and visibility delay
    async fn publish(&self, message: &QueueMessage) -> Result<(), ContractError>;
}
