//! # Reporting Worker CLI
//!
//! Entry point.
//!
//! Provides:
//! - Settings loading and validation
//! - Single-message and stream processing
//! - Effective settings display

mod cli;
mod commands;
mod worker;

use anyhow::Result;
use clap::Parser;
use observability::LoggingConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_process, run_stream, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Reporting worker starting"
    );

    let result = match &cli.command {
        Commands::Process(args) => run_process(args).await,
        Commands::Run(args) => run_stream(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_logging(&LoggingConfig::from_verbosity(
        cli.log_format.into(),
        cli.verbose,
        cli.quiet,
    ))
}
