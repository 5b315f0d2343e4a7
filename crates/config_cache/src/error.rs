//! Config cache error types

use thiserror::Error;

/// Config cache errors
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Provider could not be reached or answered with an unreadable body
    #[error("configuration provider unreachable: {message}")]
    Unreachable { message: String },

    /// HTTP client construction error
    #[error("failed to build configuration client: {message}")]
    ClientBuild { message: String },
}

impl CacheError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }
}
