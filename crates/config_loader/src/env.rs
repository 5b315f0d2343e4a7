//! Environment overlay
//!
//! Every knob can be supplied (or overridden) through an environment variable.
//! Variables that are unset leave the current value untouched.

use std::fmt::Display;
use std::str::FromStr;

use contracts::{ContractError, WorkerSettings};

pub const FLOW_SA_CONNECTION_STRING: &str = "FLOW_SA_CONNECTION_STRING";
pub const FLOWS_TABLE: &str = "FLOWS_TABLE";
pub const FLOWS_QUEUE: &str = "FLOWS_QUEUE";
pub const ORGANIZATIONS_TABLE: &str = "ORGANIZATIONS_TABLE";
pub const ORGANIZATIONS_QUEUE: &str = "ORGANIZATIONS_QUEUE";
pub const QUEUE_RETENTION_SEC: &str = "QUEUE_RETENTION_SEC";
pub const QUEUE_DELAY_SEC: &str = "QUEUE_DELAY_SEC";
pub const MAX_RETRY_QUEUING: &str = "MAX_RETRY_QUEUING";
pub const CACHE_CLIENT_HOST: &str = "CACHE_CLIENT_HOST";
pub const CACHE_PATH: &str = "CACHE_PATH";
pub const CACHE_API_KEY: &str = "CACHE_API_KEY";
pub const ENABLE_CLIENT_RETRY: &str = "ENABLE_CLIENT_RETRY";
pub const INITIAL_INTERVAL_MILLIS: &str = "INITIAL_INTERVAL_MILLIS";
pub const MAX_INTERVAL_MILLIS: &str = "MAX_INTERVAL_MILLIS";
pub const MAX_ELAPSED_TIME_MILLIS: &str = "MAX_ELAPSED_TIME_MILLIS";
pub const MULTIPLIER: &str = "MULTIPLIER";
pub const RANDOMIZATION_FACTOR: &str = "RANDOMIZATION_FACTOR";
pub const NODE_URL: &str = "NODE_URL";
pub const NODE_TIMEOUT_MS: &str = "NODE_TIMEOUT_MS";
pub const NODE_STATION_PASSWORD: &str = "NODE_STATION_PASSWORD";

/// Variable lookup, `std::env::var` in production
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read from the process environment
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Overlay environment values onto `settings`
///
/// # Errors
/// Returns `ConfigValidation` naming the variable when a numeric value does not parse.
pub fn apply(settings: &mut WorkerSettings, lookup: EnvLookup<'_>) -> Result<(), ContractError> {
    let storage = &mut settings.storage;
    set_string(&mut storage.connection_string, lookup, FLOW_SA_CONNECTION_STRING);
    set_string(&mut storage.flows_table, lookup, FLOWS_TABLE);
    set_string(&mut storage.flows_queue, lookup, FLOWS_QUEUE);
    set_string(&mut storage.organizations_table, lookup, ORGANIZATIONS_TABLE);
    set_string(&mut storage.organizations_queue, lookup, ORGANIZATIONS_QUEUE);

    let retry = &mut settings.retry;
    set_parsed(&mut retry.message_ttl_secs, lookup, QUEUE_RETENTION_SEC)?;
    set_parsed(&mut retry.initial_visibility_delay_secs, lookup, QUEUE_DELAY_SEC)?;
    set_parsed(&mut retry.max_retry, lookup, MAX_RETRY_QUEUING)?;

    let cache = &mut settings.cache;
    set_string(&mut cache.host, lookup, CACHE_CLIENT_HOST);
    set_string(&mut cache.path, lookup, CACHE_PATH);
    set_string(&mut cache.api_key, lookup, CACHE_API_KEY);

    let backoff = &mut cache.backoff;
    if let Some(value) = lookup(ENABLE_CLIENT_RETRY) {
        // Anything other than a case-insensitive "true" disables retries
        backoff.enabled = value.trim().eq_ignore_ascii_case("true");
    }
    set_parsed(&mut backoff.initial_interval_ms, lookup, INITIAL_INTERVAL_MILLIS)?;
    set_parsed(&mut backoff.max_interval_ms, lookup, MAX_INTERVAL_MILLIS)?;
    set_parsed(&mut backoff.max_elapsed_time_ms, lookup, MAX_ELAPSED_TIME_MILLIS)?;
    set_parsed(&mut backoff.multiplier, lookup, MULTIPLIER)?;
    set_parsed(&mut backoff.randomization_factor, lookup, RANDOMIZATION_FACTOR)?;

    let node = &mut settings.node;
    set_string(&mut node.url, lookup, NODE_URL);
    set_parsed(&mut node.timeout_ms, lookup, NODE_TIMEOUT_MS)?;
    if let Some(password) = lookup(NODE_STATION_PASSWORD) {
        node.station_password = Some(password).filter(|p| !p.is_empty());
    }

    Ok(())
}

fn set_string(target: &mut String, lookup: EnvLookup<'_>, key: &str) {
    if let Some(value) = lookup(key) {
        *target = value;
    }
}

fn set_parsed<T>(target: &mut T, lookup: EnvLookup<'_>, key: &str) -> Result<(), ContractError>
where
    T: FromStr,
    T::Err: Display,
{
    if let Some(value) = lookup(key) {
        *target = value.trim().parse().map_err(|e| {
            ContractError::config_validation(key, format!("invalid value '{value}': {e}"))
        })?;
    }
    Ok(())
}
