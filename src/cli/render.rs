//! Render command implementation
//!
//! Debugging affordance: prints exactly the titles and bodies the sync
//! command would write to the tracker, without making any tracker call.

use anyhow::Result;
use console::style;
use std::path::Path;

use crate::config;
use crate::dedup::dedup_findings;
use crate::render::{issue_labels, render_body, render_title};
use crate::scoring;

pub fn run(findings_path: &Path, context_path: &Path) -> Result<()> {
    let ctx = config::load_run_context(context_path)?;
    let raw_findings = config::load_findings(findings_path)?;

    let mut findings = raw_findings
        .into_iter()
        .map(scoring::normalize)
        .collect::<Result<Vec<_>>>()?;
    findings.sort_by(scoring::compare_findings_for_sort);
    let (findings, _) = dedup_findings(findings);

    if findings.is_empty() {
        eprintln!("{}", style("No findings to render.").green());
        return Ok(());
    }

    for finding in &findings {
        println!("{}", style(render_title(finding, &ctx.config.label)).bold());
        println!(
            "{}",
            style(issue_labels(finding, &ctx.config).join(", ")).dim()
        );
        println!();
        println!("{}", render_body(finding, &ctx));
        println!("{}", style("─".repeat(72)).dim());
    }
    Ok(())
}
