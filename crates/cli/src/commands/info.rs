//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::WorkerSettings;
use tracing::info;

use crate::cli::InfoArgs;
use crate::worker::load_settings;

const REDACTED: &str = "***";

/// Connection-string keys whose values are secrets
const SECRET_KEYS: [&str; 2] = ["AccountKey", "SharedAccessSignature"];

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let settings = load_settings(args.config.as_deref())?;
    info!("Displaying effective settings");

    let settings = redact(settings);
    if args.json {
        let json = config_loader::ConfigLoader::to_json(&settings)
            .context("Failed to serialize settings")?;
        println!("{}", json);
    } else {
        print_settings(&settings);
    }
    Ok(())
}

/// Mask every secret in the settings
fn redact(mut settings: WorkerSettings) -> WorkerSettings {
    if !settings.cache.api_key.is_empty() {
        settings.cache.api_key = REDACTED.to_string();
    }
    if settings.node.station_password.is_some() {
        settings.node.station_password = Some(REDACTED.to_string());
    }
    settings.storage.connection_string = redact_connection_string(&settings.storage.connection_string);
    settings
}

/// Mask `AccountKey=...;` style values, leave plain paths untouched
fn redact_connection_string(connection_string: &str) -> String {
    connection_string
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, _)) if SECRET_KEYS.iter().any(|s| s.eq_ignore_ascii_case(key.trim())) => {
                format!("{key}={REDACTED}")
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn print_settings(settings: &WorkerSettings) {
    let storage = &settings.storage;
    println!("Storage");
    println!("   ├─ Connection: {}", storage.connection_string);
    println!("   ├─ Organizations: table={} queue={}", storage.organizations_table, storage.organizations_queue);
    println!("   └─ Flows: table={} queue={}", storage.flows_table, storage.flows_queue);

    let retry = &settings.retry;
    println!("\nRetry");
    println!("   ├─ Max retry: {}", retry.max_retry);
    println!("   ├─ Message TTL: {}s", retry.message_ttl_secs);
    println!("   └─ Visibility delay: {}s", retry.initial_visibility_delay_secs);

    let cache = &settings.cache;
    println!("\nConfiguration provider");
    println!("   ├─ Endpoint: {}", cache.endpoint());
    println!("   ├─ API key: {}", if cache.api_key.is_empty() { "(none)" } else { cache.api_key.as_str() });
    let backoff = &cache.backoff;
    if backoff.enabled {
        println!(
            "   └─ Backoff: initial={}ms max={}ms elapsed={}ms x{} ±{}",
            backoff.initial_interval_ms,
            backoff.max_interval_ms,
            backoff.max_elapsed_time_ms,
            backoff.multiplier,
            backoff.randomization_factor
        );
    } else {
        println!("   └─ Backoff: disabled");
    }

    let node = &settings.node;
    println!("\nNode");
    println!("   ├─ URL: {}", node.url);
    println!("   ├─ Timeout: {}ms", node.timeout_ms);
    println!("   └─ Station password: {}", node.station_password.as_deref().unwrap_or("(none)"));
    println!();
}
