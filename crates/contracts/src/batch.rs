//! OrganizationBatch - inbound/outbound queue message body
//!
//! Wire shape: `{ "idPA": [string, ...], "retry": integer }`, `retry` defaults to 0.

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Ordered batch of organization identifiers plus its retry counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationBatch {
    /// Organization (creditor institution) identifiers, in delivery order
    #[serde(rename = "idPA")]
    pub organization_ids: Vec<String>,

    /// Number of re-deliveries this batch has already gone through
    #[serde(default)]
    pub retry: u32,
}

impl OrganizationBatch {
    /// Create a batch with retry counter 0
    pub fn new(organization_ids: Vec<String>) -> Self {
        Self {
            organization_ids,
            retry: 0,
        }
    }

    /// Single-organization batch, used for re-delivery
    pub fn single(organization_id: impl Into<String>, retry: u32) -> Self {
        Self {
            organization_ids: vec![organization_id.into()],
            retry,
        }
    }

    /// Decode a raw queue message
    ///
    /// # Errors
    /// Returns `MessageDecode` when the payload is not a valid batch.
    pub fn decode(message: &str) -> Result<Self, ContractError> {
        serde_json::from_str(message).map_err(|e| ContractError::MessageDecode {
            message: format!("invalid organization batch: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Encode to the wire representation
    pub fn encode(&self) -> Result<String, ContractError> {
        serde_json::to_string(self).map_err(|e| ContractError::MessageEncode {
            message: e.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.organization_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organization_ids.is_empty()
    }
}

/// Outbound queue message: batch body plus delivery parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    /// Message body
    pub body: OrganizationBatch,
    /// Message time-to-live in seconds
    pub time_to_live_secs: u64,
    /// Initial visibility delay in seconds
    pub visibility_delay_secs: u64,
}
