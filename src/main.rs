//! vibecheck-sync entry point.
//!
//! Logs go to stderr so stdout stays reserved for the run's stats record.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    // Parse CLI args and run
    let cli = vibecheck_sync::cli::Cli::parse();
    vibecheck_sync::cli::run(cli)
}
