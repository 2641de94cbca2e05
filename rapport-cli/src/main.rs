//! ## rapport-cli
//! **Console front end for the report-queueing simulator**
//!
//! Drives the engine through its public accessors only: a `step` mode that
//! prints one table row per clock step for inspection, and an `auto` mode
//! that runs to completion and prints the cumulative summary.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

use commands::Cli;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    commands::run_command(cli)
}
