//! Message loop: bounded concurrent invocations over a line stream.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{ConfigProvider, FlowListClient, FlowProcessor, RetryQueue};
use dispatcher::BatchDispatcher;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

use super::RunStats;

/// Dispatch every non-empty line of `reader`, at most `concurrency` at a time
///
/// All invocations share the dispatcher and therefore one configuration cache.
#[instrument(name = "worker_run_messages", skip(dispatcher, reader))]
pub async fn run_messages<P, C, Q, F, R>(
    dispatcher: Arc<BatchDispatcher<P, C, Q, F>>,
    reader: R,
    concurrency: usize,
) -> Result<RunStats>
where
    P: ConfigProvider + Send + Sync + 'static,
    C: FlowListClient + Send + Sync + 'static,
    Q: RetryQueue + Send + Sync + 'static,
    F: FlowProcessor + Send + Sync + 'static,
    R: AsyncBufRead + Unpin,
{
    let started = Instant::now();
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut stats = RunStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await.context("Failed to read message")? {
        let message = line.trim().to_string();
        if message.is_empty() {
            continue;
        }
        stats.messages += 1;

        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .context("Invocation limiter closed")?;
        let dispatcher = Arc::clone(&dispatcher);
        tasks.spawn(async move {
            let result = dispatcher.dispatch(&message).await;
            drop(permit);
            result
        });

        while let Some(joined) = tasks.try_join_next() {
            stats.record(&joined.context("Invocation task failed")?);
        }
    }

    debug!(in_flight = tasks.len(), "Input exhausted, draining");
    while let Some(joined) = tasks.join_next().await {
        stats.record(&joined.context("Invocation task failed")?);
    }

    stats.duration = started.elapsed();
    info!(
        messages = stats.messages,
        completed = stats.completed,
        decode_failed = stats.decode_failed,
        aborted = stats.fatal,
        "Message stream processed"
    );
    Ok(stats)
}
