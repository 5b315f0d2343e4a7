//! Worker assembly and message loop.

mod adapters;
mod orchestrator;
mod stats;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use config_cache::{ApiConfigClient, ConfigCache};
use contracts::WorkerSettings;
use dispatcher::{BatchDispatcher, FileFlowProcessor, FileQueue, LogFlowProcessor, RetryScheduler};
use node_client::{HttpFlowListClient, MockFlowListClient};
use tracing::info;

use crate::cli::{NodeKind, ProcessorKind, WorkerArgs};

pub use adapters::{NodeAdapter, ProcessorAdapter};
pub use orchestrator::run_messages;
pub use stats::RunStats;

/// Production dispatcher
pub type Worker = BatchDispatcher<ApiConfigClient, NodeAdapter, FileQueue, ProcessorAdapter>;

/// Load settings from the optional file plus the process environment
pub fn load_settings(path: Option<&Path>) -> Result<WorkerSettings> {
    match path {
        Some(path) => info!(config = %path.display(), "Loading settings"),
        None => info!("Loading settings from environment"),
    }
    config_loader::ConfigLoader::load(path).context("Failed to load worker settings")
}

/// Wire a dispatcher from settings and adapter selection
pub fn build_worker(settings: &WorkerSettings, args: &WorkerArgs) -> Result<Worker> {
    let provider =
        ApiConfigClient::new(&settings.cache).context("Failed to create configuration client")?;
    let cache = Arc::new(ConfigCache::new(provider));

    let node = match args.node {
        NodeKind::Http => NodeAdapter::Http(
            HttpFlowListClient::new(&settings.node).context("Failed to create node client")?,
        ),
        NodeKind::Mock => NodeAdapter::Mock(MockFlowListClient::new()),
    };

    let storage = &settings.storage;
    let spool_root = Path::new(&storage.connection_string);
    let queue = FileQueue::new(spool_root, &storage.organizations_queue).with_context(|| {
        format!("Failed to open retry queue spool under {}", spool_root.display())
    })?;

    let processor = match args.processor {
        ProcessorKind::File => ProcessorAdapter::File(
            FileFlowProcessor::new(spool_root, &storage.flows_queue, &storage.flows_table)
                .with_context(|| {
                    format!("Failed to open flow spool under {}", spool_root.display())
                })?,
        ),
        ProcessorKind::Log => ProcessorAdapter::Log(LogFlowProcessor::new("log")),
    };

    info!(
        cache = %settings.cache.endpoint(),
        node = ?args.node,
        processor = ?args.processor,
        spool = %spool_root.display(),
        max_retry = settings.retry.max_retry,
        "Worker assembled"
    );

    Ok(
        BatchDispatcher::new(cache, node, RetryScheduler::new(queue, &settings.retry), processor)
            .with_station_password(settings.node.station_password.clone()),
    )
}
