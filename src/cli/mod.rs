//! CLI command definitions and handlers

mod render;
mod sync;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// vibecheck-sync - Findings-to-issues synchronizer
///
/// Normalizes static-analysis findings and reconciles them against the
/// repository's issue tracker. Designed to run from CI schedules;
/// reruns on an unchanged repository are no-ops.
#[derive(Parser, Debug)]
#[command(name = "vibecheck-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile current findings against the issue tracker
    Sync {
        /// Findings feed: a JSON array, or an object with a "findings" array
        #[arg(long)]
        findings: PathBuf,

        /// Run context JSON: repo coordinates, run number, issue config
        #[arg(long)]
        context: PathBuf,

        /// Plan only: print the operations without executing any of them
        #[arg(long)]
        dry_run: bool,
    },

    /// Render issue titles and bodies to stdout without touching the tracker
    Render {
        /// Findings feed: a JSON array, or an object with a "findings" array
        #[arg(long)]
        findings: PathBuf,

        /// Run context JSON: repo coordinates, run number, issue config
        #[arg(long)]
        context: PathBuf,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync {
            findings,
            context,
            dry_run,
        } => sync::run(&findings, &context, dry_run),

        Commands::Render { findings, context } => render::run(&findings, &context),
    }
}
