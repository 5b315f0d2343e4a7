//! # Config Cache
//!
//! Routing configuration cache.
//!
//! Responsibilities:
//! - Hold the current `ConfigSnapshot` and swap it atomically
//! - Refresh lazily when absent or retrieved on an earlier date, single-flight
//! - Fetch from the configuration provider over HTTP, with optional exponential backoff

pub mod api_config;
pub mod backoff;
pub mod cache;
pub mod error;

pub use api_config::{ApiConfigClient, SUBSCRIPTION_KEY_HEADER};
pub use backoff::ExponentialBackoff;
pub use cache::ConfigCache;
pub use contracts::{ConfigProvider, ConfigSnapshot};
pub use error::CacheError;
