//! `run` command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::info;

use crate::cli::RunArgs;
use crate::worker::{build_worker, load_settings, run_messages};

/// Execute the `run` command
///
/// Fails when any invocation was aborted, so that the caller can redeliver.
pub async fn run_stream(args: &RunArgs) -> Result<()> {
    let settings = load_settings(args.worker.config.as_deref())?;
    if args.worker.metrics_port != 0 {
        observability::init_metrics_only(args.worker.metrics_port)?;
    }

    let worker = Arc::new(build_worker(&settings, &args.worker)?);
    info!(concurrency = args.concurrency, "Starting message loop");

    let stats = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            run_messages(worker, BufReader::new(file), args.concurrency).await?
        }
        None => run_messages(worker, BufReader::new(tokio::io::stdin()), args.concurrency).await?,
    };

    stats.print_summary();

    if stats.fatal > 0 {
        anyhow::bail!(
            "{} of {} invocations aborted (configuration provider unreachable)",
            stats.fatal,
            stats.messages
        );
    }
    Ok(())
}
