//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Reporting worker - retrieves reporting flow lists for batches of organizations
#[derive(Parser, Debug)]
#[command(
    name = "reporting-worker",
    author,
    version,
    about = "Reporting flow retrieval worker",
    long_about = "Consumes organization batch messages, resolves each organization's station \n\
                  and broker from the configuration provider, asks the payment node for its \n\
                  reporting flows and hands them downstream, requeueing unreachable calls."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "REPORTING_WORKER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "json",
        global = true,
        env = "REPORTING_WORKER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a single batch message
    Process(ProcessArgs),

    /// Process newline-delimited batch messages
    Run(RunArgs),

    /// Validate settings without processing anything
    Validate(ValidateArgs),

    /// Display the effective settings
    Info(InfoArgs),
}

/// Settings source and adapter selection shared by `process` and `run`
#[derive(Args, Debug, Clone)]
pub struct WorkerArgs {
    /// Settings file (TOML or JSON); environment variables are applied on top
    #[arg(short, long, env = "REPORTING_WORKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Remote flow-list client
    #[arg(long, value_enum, default_value = "http")]
    pub node: NodeKind,

    /// Downstream flow processor
    #[arg(long, value_enum, default_value = "file")]
    pub processor: ProcessorKind,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "REPORTING_WORKER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `process` command
#[derive(Args, Debug, Clone)]
pub struct ProcessArgs {
    #[command(flatten)]
    pub worker: WorkerArgs,

    /// Message body, e.g. '{"idPA":["77777777777"]}'
    #[arg(short, long, conflicts_with = "input")]
    pub message: Option<String>,

    /// File holding the message body (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Print the invocation report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `run` command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub worker: WorkerArgs,

    /// File with one message per line (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Maximum number of invocations in flight
    #[arg(long, default_value = "4", env = "REPORTING_WORKER_CONCURRENCY")]
    pub concurrency: usize,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Settings file to validate (environment variables are applied on top)
    #[arg(short, long, env = "REPORTING_WORKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Settings file (environment variables are applied on top)
    #[arg(short, long, env = "REPORTING_WORKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    #[default]
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Remote flow-list client selection
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// HTTP gateway at `node.url`
    Http,
    /// Scripted client answering every organization with an empty listing
    Mock,
}

/// Flow processor selection
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessorKind {
    /// JSON-lines spool under the storage root
    File,
    /// Log only
    Log,
}
