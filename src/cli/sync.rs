//! Sync command implementation

use anyhow::{bail, Result};
use console::style;
use std::path::Path;
use tracing::info;

use crate::config;
use crate::dedup::dedup_findings;
use crate::models::SyncStats;
use crate::reconcile::{self, CancelToken, Op, Plan};
use crate::scoring;
use crate::tracker::{GitHubTracker, Tracker};

pub fn run(findings_path: &Path, context_path: &Path, dry_run: bool) -> Result<()> {
    let ctx = config::load_run_context(context_path)?;
    let raw_findings = config::load_findings(findings_path)?;

    if !ctx.config.enabled {
        info!("Issue sync is disabled; nothing to do");
        print_stats(&SyncStats::default())?;
        return Ok(());
    }

    let mut findings = raw_findings
        .into_iter()
        .map(scoring::normalize)
        .collect::<Result<Vec<_>>>()?;
    findings.sort_by(scoring::compare_findings_for_sort);
    let (findings, skipped_duplicate) = dedup_findings(findings);
    info!(
        "Run {}: {} findings after dedup",
        ctx.run_number,
        findings.len()
    );

    let tracker = GitHubTracker::from_env(&ctx.repo)?;
    let existing = tracker.search_issues_by_label(std::slice::from_ref(&ctx.config.label))?;

    let plan = reconcile::plan(&findings, &existing, &ctx.config, ctx.run_number);

    if dry_run {
        print_plan(&plan);
        print_stats(&plan.projected_stats(skipped_duplicate))?;
        return Ok(());
    }

    let outcome = reconcile::execute(&tracker, &plan, &ctx, &CancelToken::new());
    let mut stats = outcome.stats;
    stats.skipped_duplicate = skipped_duplicate;

    print_summary(&stats);
    print_stats(&stats)?;

    if outcome.failed_ops > 0 {
        bail!("{} tracker operations failed", outcome.failed_ops);
    }
    Ok(())
}

/// Human-readable plan listing, on stderr so stdout stays machine-readable.
fn print_plan(plan: &Plan) {
    eprintln!("{}", style("Planned operations:").bold());
    if plan.ops.is_empty() {
        eprintln!("  {}", style("nothing to do").dim());
    }
    for op in &plan.ops {
        match op {
            Op::Create { finding } => {
                eprintln!("  {}  {}", style("create ").green(), finding.title);
            }
            Op::Update { number, finding } => {
                eprintln!("  {}  #{number} {}", style("update ").cyan(), finding.title);
            }
            Op::Comment { number, .. } => {
                eprintln!("  {}  #{number}", style("comment").dim());
            }
            Op::Close { number, .. } => {
                eprintln!("  {}  #{number}", style("close  ").red());
            }
            Op::CloseDuplicate { issue, canonical } => {
                eprintln!(
                    "  {}  {issue:?} (duplicate of {canonical:?})",
                    style("close  ").red()
                );
            }
        }
    }
}

fn print_summary(stats: &SyncStats) {
    eprintln!(
        "{} {} created, {} updated, {} closed ({} below threshold, {} duplicates, {} over cap)",
        style("Sync complete:").bold(),
        style(stats.created).green(),
        style(stats.updated).cyan(),
        style(stats.closed).red(),
        stats.skipped_below_threshold,
        stats.skipped_duplicate,
        stats.skipped_max_reached,
    );
}

/// The run's machine-readable result record, on stdout.
fn print_stats(stats: &SyncStats) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}
