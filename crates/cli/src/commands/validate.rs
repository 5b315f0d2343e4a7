//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::WorkerSettings;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SettingsSummary>,
}

#[derive(Serialize)]
struct SettingsSummary {
    cache_endpoint: String,
    node_url: String,
    organizations_queue: String,
    flows_queue: String,
    max_retry: u32,
    backoff_enabled: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let result = validate_settings(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Settings validation failed")
    }
}

fn validate_settings(args: &ValidateArgs) -> ValidationResult {
    let source = match &args.config {
        Some(path) => path.display().to_string(),
        None => "environment".to_string(),
    };
    info!(source = %source, "Validating settings");

    if let Some(path) = &args.config {
        if !path.exists() {
            return ValidationResult {
                valid: false,
                source,
                error: Some(format!("File not found: {}", path.display())),
                warnings: None,
                summary: None,
            };
        }
    }

    match config_loader::ConfigLoader::load(args.config.as_deref()) {
        Ok(settings) => {
            let warnings = collect_warnings(&settings);
            ValidationResult {
                valid: true,
                source,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(SettingsSummary {
                    cache_endpoint: settings.cache.endpoint(),
                    node_url: settings.node.url.clone(),
                    organizations_queue: settings.storage.organizations_queue.clone(),
                    flows_queue: settings.storage.flows_queue.clone(),
                    max_retry: settings.retry.max_retry,
                    backoff_enabled: settings.cache.backoff.enabled,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            source,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Non-fatal findings
fn collect_warnings(settings: &WorkerSettings) -> Vec<String> {
    let mut warnings = Vec::new();

    if settings.cache.api_key.is_empty() {
        warnings.push("cache.api_key is empty - the provider will likely answer 401".to_string());
    }
    if settings.retry.max_retry == 0 {
        warnings.push("retry.max_retry is 0 - unreachable organizations are never requeued".to_string());
    }
    if settings.retry.initial_visibility_delay_secs >= settings.retry.message_ttl_secs {
        warnings.push(
            "retry.initial_visibility_delay_secs >= retry.message_ttl_secs - requeued messages expire before delivery"
                .to_string(),
        );
    }
    if settings.node.station_password.is_none() {
        warnings.push("node.station_password is not set".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Settings are valid: {}", result.source);

        if let Some(ref summary) = result.summary {
            println!("\n  Cache endpoint: {}", summary.cache_endpoint);
            println!("  Node URL: {}", summary.node_url);
            println!("  Organizations queue: {}", summary.organizations_queue);
            println!("  Flows queue: {}", summary.flows_queue);
            println!("  Max retry: {}", summary.max_retry);
            println!("  Backoff: {}", if summary.backoff_enabled { "enabled" } else { "disabled" });
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Settings are invalid: {}", result.source);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
