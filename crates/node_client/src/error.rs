//! Node client errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeClientError {
    #[error("invalid node url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to build node client: {message}")]
    ClientBuild { message: String },
}

pub type Result<T> = std::result::Result<T, NodeClientError>;
