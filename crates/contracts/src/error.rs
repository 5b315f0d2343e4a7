//! Layered error definitions
//!
//! Categorized by source: config / message / queue / processor

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Message Errors =====
    /// Inbound batch message could not be decoded
    #[error("message decode error: {message}")]
    MessageDecode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Outbound message could not be encoded
    #[error("message encode error: {message}")]
    MessageEncode { message: String },

    // ===== Queue Errors =====
    /// Retry queue publish error
    #[error("queue '{queue}' publish error: {message}")]
    QueuePublish { queue: String, message: String },

    // ===== Processor Errors =====
    /// Downstream handoff error
    #[error("processor '{processor}' failed for organization '{organization_id}': {message}")]
    Handoff {
        processor: String,
        organization_id: String,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create queue publish error
    pub fn queue_publish(queue: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueuePublish {
            queue: queue.into(),
            message: message.into(),
        }
    }

    /// Create downstream handoff error
    pub fn handoff(
        processor: impl Into<String>,
        organization_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Handoff {
            processor: processor.into(),
            organization_id: organization_id.into(),
            message: message.into(),
        }
    }
}
