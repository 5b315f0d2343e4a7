//! WorkerSettings - Config Loader output
//!
//! Storage/queue names, retry policy, configuration provider and remote node endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Complete worker settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct WorkerSettings {
    /// Storage and queue names
    #[serde(default)]
    #[validate(nested)]
    pub storage: StorageSettings,

    /// Requeue policy
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetrySettings,

    /// Configuration provider
    #[serde(default)]
    #[validate(nested)]
    pub cache: CacheSettings,

    /// Remote reporting service
    #[serde(default)]
    #[validate(nested)]
    pub node: NodeSettings,
}

/// Storage account / queue settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StorageSettings {
    /// Storage connection; the file adapters treat it as the spool root directory
    #[validate(length(min = 1, message = "connection string cannot be empty"))]
    pub connection_string: String,

    #[validate(length(min = 1, message = "table name cannot be empty"))]
    pub flows_table: String,

    #[validate(length(min = 1, message = "queue name cannot be empty"))]
    pub flows_queue: String,

    #[validate(length(min = 1, message = "table name cannot be empty"))]
    pub organizations_table: String,

    #[validate(length(min = 1, message = "queue name cannot be empty"))]
    pub organizations_queue: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            connection_string: "./spool".to_string(),
            flows_table: "flows".to_string(),
            flows_queue: "flows".to_string(),
            organizations_table: "organizations".to_string(),
            organizations_queue: "organizations".to_string(),
        }
    }
}

/// Requeue policy
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RetrySettings {
    /// Time-to-live of re-delivery messages
    #[validate(range(min = 1, message = "message ttl must be > 0"))]
    pub message_ttl_secs: u64,

    /// Initial visibility delay of re-delivery messages
    pub initial_visibility_delay_secs: u64,

    /// Highest retry counter a re-delivery message may carry
    pub max_retry: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            message_ttl_secs: 86_400,
            initial_visibility_delay_secs: 3_600,
            max_retry: 5,
        }
    }
}

/// Configuration provider settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheSettings {
    /// Provider host, e.g. `https://api.example.org`
    #[validate(length(min = 1, message = "cache host is required"))]
    pub host: String,

    /// Path (and query) of the cache resource
    #[validate(length(min = 1, message = "cache path cannot be empty"))]
    pub path: String,

    /// Value of the `Ocp-Apim-Subscription-Key` header
    pub api_key: String,

    #[validate(nested)]
    pub backoff: BackoffSettings,
}

impl CacheSettings {
    /// Full provider URL
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), self.path)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            path: "/cache?keys=creditorInstitutionStations,stations".to_string(),
            api_key: String::new(),
            backoff: BackoffSettings::default(),
        }
    }
}

/// Exponential backoff applied to provider calls
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BackoffSettings {
    pub enabled: bool,

    #[validate(range(min = 1, message = "initial interval must be > 0"))]
    pub initial_interval_ms: u64,

    #[validate(range(min = 1, message = "max interval must be > 0"))]
    pub max_interval_ms: u64,

    pub max_elapsed_time_ms: u64,

    #[validate(range(min = 1.0, message = "multiplier must be >= 1"))]
    pub multiplier: f64,

    #[validate(range(min = 0.0, max = 1.0, message = "randomization factor must be within [0, 1]"))]
    pub randomization_factor: f64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_interval_ms: 500,
            max_interval_ms: 1_000,
            max_elapsed_time_ms: 1_000,
            multiplier: 1.5,
            randomization_factor: 0.5,
        }
    }
}

/// Remote reporting service settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NodeSettings {
    /// Flow-list endpoint URL
    #[validate(length(min = 1, message = "node url is required"))]
    pub url: String,

    /// Per-call timeout
    #[validate(range(min = 1, message = "node timeout must be > 0"))]
    pub timeout_ms: u64,

    /// Station password sent with every request
    pub station_password: Option<String>,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_ms: 30_000,
            station_password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_require_endpoints() {
        let settings = WorkerSettings::default();
        let errors = settings.validate().unwrap_err().to_string();
        assert!(errors.contains("cache host is required"), "got: {errors}");
        assert!(errors.contains("node url is required"), "got: {errors}");
    }

    #[test]
    fn test_endpoint_joins_host_and_path() {
        let cache = CacheSettings {
            host: "https://api.example.org/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            cache.endpoint(),
            "https://api.example.org/cache?keys=creditorInstitutionStations,stations"
        );
    }

    #[test]
    fn test_backoff_bounds() {
        let backoff = BackoffSettings {
            randomization_factor: 1.5,
            ..Default::default()
        };
        assert!(backoff.validate().is_err());
        assert!(BackoffSettings::default().validate().is_ok());
    }
}
