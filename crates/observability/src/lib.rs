//! # Observability
//!
//! Log subscriber and Prometheus exporter for the worker, plus the outcome
//! counters every component records into.
//!
//! Logging is installed once at startup from the command-line verbosity. The
//! exporter is installed later, only by the commands that dispatch messages,
//! and only when a metrics port was given.
//!
//! ```ignore
//! observability::init_logging(&LoggingConfig::from_verbosity(
//!     LogFormat::Json,
//!     cli.verbose,
//!     cli.quiet,
//! ))?;
//!
//! // later, in `process` / `run`
//! if metrics_port != 0 {
//!     observability::init_metrics_only(metrics_port)?;
//! }
//! observability::record_organization_outcome("handed_off");
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

pub use crate::metrics::{
    record_config_refresh, record_invocation, record_organization_outcome, record_rpc_latency_ms,
    OutcomeAggregator, OutcomeSummary, RunningStats, StatsSummary,
};

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON
    #[default]
    Json,
    /// Human readable, multi-line
    Pretty,
    /// Single line
    Compact,
}

/// Logging setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Directive used when `RUST_LOG` is unset
    pub default_level: &'static str,
}

impl LoggingConfig {
    /// `-q` wins over any number of `-v`
    pub fn from_verbosity(format: LogFormat, verbose: u8, quiet: bool) -> Self {
        let default_level = match (quiet, verbose) {
            (true, _) => "error",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        };
        Self {
            format,
            default_level,
        }
    }
}

/// Install the global tracing subscriber, writing to stderr
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_level));

    tracing_subscriber::registry()
        .with(format_layer(config.format).with_filter(filter))
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(
        log_format = ?config.format,
        default_level = config.default_level,
        "Logging initialized"
    );
    Ok(())
}

fn format_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    }
}

/// Install the Prometheus recorder with an HTTP listener on `port`
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
