//! Settings validation
//!
//! Rules:
//! - field-level rules declared on `WorkerSettings` (non-empty names, positive timings)
//! - provider host and node url are http(s) URLs
//! - cache path is absolute
//! - backoff initial interval <= max interval

use contracts::{ContractError, WorkerSettings};
use validator::Validate;

/// Validate WorkerSettings
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(settings: &WorkerSettings) -> Result<(), ContractError> {
    validate_fields(settings)?;
    validate_endpoints(settings)?;
    validate_backoff(settings)?;
    Ok(())
}

/// Declarative field rules
fn validate_fields(settings: &WorkerSettings) -> Result<(), ContractError> {
    settings
        .validate()
        .map_err(|e| ContractError::config_validation("settings", e.to_string()))
}

fn validate_endpoints(settings: &WorkerSettings) -> Result<(), ContractError> {
    if !is_http_url(&settings.cache.host) {
        return Err(ContractError::config_validation(
            "cache.host",
            format!(
                "cache host must start with http:// or https://, got '{}'",
                settings.cache.host
            ),
        ));
    }

    if !settings.cache.path.starts_with('/') {
        return Err(ContractError::config_validation(
            "cache.path",
            format!("cache path must start with '/', got '{}'", settings.cache.path),
        ));
    }

    if !is_http_url(&settings.node.url) {
        return Err(ContractError::config_validation(
            "node.url",
            format!(
                "node url must start with http:// or https://, got '{}'",
                settings.node.url
            ),
        ));
    }

    Ok(())
}

fn validate_backoff(settings: &WorkerSettings) -> Result<(), ContractError> {
    let backoff = &settings.cache.backoff;
    for (field, value) in [
        ("cache.backoff.multiplier", backoff.multiplier),
        ("cache.backoff.randomization_factor", backoff.randomization_factor),
    ] {
        if !value.is_finite() {
            return Err(ContractError::config_validation(
                field,
                format!("must be a finite number, got {value}"),
            ));
        }
    }
    if backoff.initial_interval_ms > backoff.max_interval_ms {
        return Err(ContractError::config_validation(
            "cache.backoff.initial_interval_ms / cache.backoff.max_interval_ms",
            format!(
                "initial_interval_ms ({}) must be <= max_interval_ms ({})",
                backoff.initial_interval_ms, backoff.max_interval_ms
            ),
        ));
    }
    Ok(())
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}
