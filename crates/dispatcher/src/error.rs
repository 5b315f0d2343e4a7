//! Dispatcher error types

use config_cache::CacheError;
use thiserror::Error;

/// Invocation-level failures
///
/// Anything scoped to a single organization is reported in the
/// `InvocationReport` instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Message body is not a valid organization batch (dropped, never retried)
    #[error("message dropped: {0}")]
    MessageDecode(#[source] contracts::ContractError),

    /// Configuration provider unreachable (invocation aborted)
    #[error("invocation aborted: {0}")]
    Cache(#[from] CacheError),

    /// Adapter creation error
    #[error("failed to create {kind} '{name}': {message}")]
    AdapterCreation {
        kind: &'static str,
        name: String,
        message: String,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    pub fn adapter_creation(
        kind: &'static str,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::AdapterCreation {
            kind,
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether the platform should redeliver the message
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MessageDecode(_))
    }

    /// Label for the invocation status metric
    pub fn status(&self) -> &'static str {
        match self {
            Self::MessageDecode(_) => "decode_failed",
            _ => "fatal",
        }
    }
}
