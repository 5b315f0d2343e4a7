//! `process` command implementation.

use anyhow::{Context, Result};
use dispatcher::{DispatchError, InvocationReport, OrganizationOutcome};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::cli::ProcessArgs;
use crate::worker::{build_worker, load_settings};

#[derive(Serialize)]
struct ReportOutput<'a> {
    retry: u32,
    organizations: Vec<OrganizationOutput<'a>>,
}

#[derive(Serialize)]
struct OrganizationOutput<'a> {
    organization_id: &'a str,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// Execute the `process` command
///
/// A message that cannot be decoded is dropped and the command still succeeds;
/// an unreachable configuration provider fails it so the message is redelivered.
pub async fn run_process(args: &ProcessArgs) -> Result<()> {
    let settings = load_settings(args.worker.config.as_deref())?;
    if args.worker.metrics_port != 0 {
        observability::init_metrics_only(args.worker.metrics_port)?;
    }

    let message = read_message(args).await?;
    let worker = build_worker(&settings, &args.worker)?;

    match worker.dispatch(&message).await {
        Ok(report) => {
            info!(organizations = report.len(), "Invocation completed");
            print_report(&report, args.json)
        }
        Err(e @ DispatchError::MessageDecode(_)) => {
            warn!(error = %e, "Message discarded");
            Ok(())
        }
        Err(e) => Err(e).context("Invocation aborted"),
    }
}

async fn read_message(args: &ProcessArgs) -> Result<String> {
    if let Some(message) = &args.message {
        return Ok(message.clone());
    }
    if let Some(path) = &args.input {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read message from {}", path.display()));
    }
    let mut message = String::new();
    tokio::io::stdin()
        .read_to_string(&mut message)
        .await
        .context("Failed to read message from stdin")?;
    Ok(message)
}

fn detail(outcome: &OrganizationOutcome) -> Option<String> {
    match outcome {
        OrganizationOutcome::HandedOff { flow_count } => Some(format!("{flow_count} flows")),
        OrganizationOutcome::Unresolved => None,
        OrganizationOutcome::BusinessFault { description } => Some(description.clone()),
        OrganizationOutcome::Requeued { retry } | OrganizationOutcome::RetryExhausted { retry } => {
            Some(format!("retry {retry}"))
        }
        OrganizationOutcome::HandoffFailed { message }
        | OrganizationOutcome::RequeueFailed { message } => Some(message.clone()),
    }
}

fn print_report(report: &InvocationReport, json: bool) -> Result<()> {
    let output = ReportOutput {
        retry: report.retry,
        organizations: report
            .organizations
            .iter()
            .map(|entry| OrganizationOutput {
                organization_id: &entry.organization_id,
                outcome: entry.outcome.label(),
                detail: detail(&entry.outcome),
            })
            .collect(),
    };

    if json {
        let json =
            serde_json::to_string_pretty(&output).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        println!("Batch (retry {}):", output.retry);
        for entry in &output.organizations {
            match &entry.detail {
                Some(detail) => println!("  {} {} ({})", entry.organization_id, entry.outcome, detail),
                None => println!("  {} {}", entry.organization_id, entry.outcome),
            }
        }
    }
    Ok(())
}
