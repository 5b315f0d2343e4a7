//! ConfigProvider trait - remote routing configuration source

use thiserror::Error;

use crate::CachePayload;

/// Configuration provider failure
///
/// Status failures (4xx/5xx) mean the provider was reached but refused or failed;
/// transport and decode failures mean no usable answer came back at all.
#[derive(Debug, Error)]
pub enum ConfigFetchError {
    /// 4xx response
    #[error("error {status} calling the service URL {url}")]
    Client { status: u16, url: String },

    /// 5xx response
    #[error("error {status} calling the service URL {url}")]
    Server { status: u16, url: String },

    /// Network / IO failure reaching the provider
    #[error("configuration provider unreachable at {url}: {message}")]
    Transport { url: String, message: String },

    /// Response body could not be read or decoded
    #[error("configuration payload from {url} could not be decoded: {message}")]
    Decode { url: String, message: String },
}

impl ConfigFetchError {
    /// Classify an unsuccessful HTTP status
    ///
    /// Returns `None` for statuses outside the 4xx/5xx ranges.
    pub fn from_status(status: u16, url: impl Into<String>) -> Option<Self> {
        match status / 100 {
            4 => Some(Self::Client {
                status,
                url: url.into(),
            }),
            5 => Some(Self::Server {
                status,
                url: url.into(),
            }),
            _ => None,
        }
    }

    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Whether the failure must abort the whole invocation
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Decode { .. })
    }
}

/// Source of routing configuration
#[trait_variant::make(ConfigProvider: Send)]
pub trait LocalConfigProvider {
    /// Provider name (used for logging)
    fn name(&self) -> &str;

    /// Fetch the full routing configuration
    async fn fetch(&self) -> Result<CachePayload, ConfigFetchError>;
}
