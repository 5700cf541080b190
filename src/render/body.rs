//! Issue body rendering.
//!
//! Bodies are deterministic GitHub-flavored Markdown: given the same
//! finding and run context the output is byte-identical, which is what
//! keeps updates from churning issue bodies run after run. The two hidden
//! markers at the bottom carry all cross-run state.

use super::{markers, rules};
use crate::config::RunContext;
use crate::fingerprint::short_fingerprint;
use crate::models::{Autofix, Finding, Location, Severity, SuggestedFix, Tool};

/// Snippets longer than this are cut with an ellipsis line.
const MAX_SNIPPET_LINES: usize = 50;

/// At most this many snippets are rendered.
const MAX_SNIPPETS: usize = 3;

/// Location lists longer than this go inside a collapsible block.
const INLINE_LOCATION_LIMIT: usize = 10;

/// Render the full issue body for a finding.
pub fn render_body(finding: &Finding, ctx: &RunContext) -> String {
    let mut md = String::new();

    md.push_str(&render_severity_line(finding));
    md.push_str("\n\n");

    if !finding.message.is_empty() {
        md.push_str(&finding.message);
        md.push_str("\n\n");
    }

    md.push_str(&render_details(finding));
    md.push('\n');

    if matches!(finding.severity, Severity::Critical | Severity::High) {
        md.push_str("> ⚠️ **High-priority finding.** Address this before lower-severity cleanup.\n\n");
    }

    md.push_str(&render_location(finding, ctx));
    md.push('\n');

    md.push_str(&render_code_samples(finding));
    md.push_str(&render_fix(finding));
    md.push_str(&render_references(finding));
    md.push_str(&render_metadata(finding, ctx));

    md.push_str(&markers::fingerprint_marker(&finding.fingerprint));
    md.push('\n');
    md.push_str(&markers::run_marker(
        ctx.run_number,
        &format_timestamp(ctx),
    ));
    md.push('\n');

    md
}

fn format_timestamp(ctx: &RunContext) -> String {
    ctx.timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "🔴",
        Severity::High => "🟠",
        Severity::Medium => "🟡",
        Severity::Low => "🔵",
        _ => "⚪",
    }
}

fn render_severity_line(finding: &Finding) -> String {
    format!(
        "{} **Severity**: {} | **Confidence**: {} | **Effort**: {}",
        severity_emoji(finding.severity),
        finding.severity,
        finding.confidence,
        finding.effort
    )
}

fn autofix_text(autofix: Autofix) -> &'static str {
    match autofix {
        Autofix::Safe => "✅ Safe autofix available",
        Autofix::RequiresReview => "⚠️ Autofix requires review",
        Autofix::None => "Manual fix required",
    }
}

fn render_details(finding: &Finding) -> String {
    format!(
        "## Details\n\n\
         | Field | Value |\n\
         |-------|-------|\n\
         | Tool | `{}` |\n\
         | Rule | {} |\n\
         | Layer | {} |\n\
         | Autofix | {} |\n",
        finding.tool,
        rules::render_rule(finding.tool, &finding.rule_id),
        finding.layer,
        autofix_text(finding.autofix)
    )
}

fn location_link(location: &Location, ctx: &RunContext) -> String {
    let label = match location.end_line {
        Some(end) if end > location.start_line => {
            format!("{}:{}-{}", location.path, location.start_line, end)
        }
        _ => format!("{}:{}", location.path, location.start_line),
    };
    format!(
        "[`{}`]({})",
        label,
        ctx.repo
            .blob_url(&location.path, location.start_line, location.end_line)
    )
}

fn render_location(finding: &Finding, ctx: &RunContext) -> String {
    let mut md = String::from("## Location\n\n");
    md.push_str(&location_link(finding.canonical_location(), ctx));
    md.push('\n');

    let rest = &finding.locations[1..];
    if !rest.is_empty() {
        if rest.len() <= INLINE_LOCATION_LIMIT {
            md.push('\n');
            for location in rest {
                md.push_str(&format!("- {}\n", location_link(location, ctx)));
            }
        } else {
            md.push_str(&format!(
                "\n<details>\n<summary>{} more locations</summary>\n\n",
                rest.len()
            ));
            for location in rest {
                md.push_str(&format!("- {}\n", location_link(location, ctx)));
            }
            md.push_str("\n</details>\n");
        }
    }

    if finding.locations.len() >= 5 {
        md.push('\n');
        md.push_str(&prioritization_hint(finding));
        md.push('\n');
    }
    md
}

/// Name the file with the most occurrences so a reader knows where to
/// start; for wide findings also state the spread.
fn prioritization_hint(finding: &Finding) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for location in &finding.locations {
        match counts.iter_mut().find(|(path, _)| *path == location.path) {
            Some((_, n)) => *n += 1,
            None => counts.push((&location.path, 1)),
        }
    }
    let (busiest, occurrences) = counts
        .iter()
        .max_by_key(|(_, n)| *n)
        .copied()
        .unwrap_or(("", 0));

    let mut hint = format!("_Start with `{busiest}` ({occurrences} occurrences)._");
    if counts.len() > 3 {
        hint.push_str(&format!(" _The findings span {} files._", counts.len()));
    }
    hint
}

fn render_code_samples(finding: &Finding) -> String {
    let Some(snippet) = finding
        .evidence
        .as_ref()
        .and_then(|e| e.snippet.as_deref())
    else {
        return String::new();
    };

    let samples: Vec<&str> = snippet
        .split("---")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if samples.is_empty() {
        return String::new();
    }

    let heading = if samples.len() == 1 {
        "## Code Sample"
    } else {
        "## Code Samples"
    };
    let mut md = format!("{heading}\n\n");

    for sample in samples.iter().take(MAX_SNIPPETS) {
        md.push_str("```\n");
        let lines: Vec<&str> = sample.lines().collect();
        for line in lines.iter().take(MAX_SNIPPET_LINES) {
            md.push_str(line);
            md.push('\n');
        }
        if lines.len() > MAX_SNIPPET_LINES {
            md.push_str("...\n");
        }
        md.push_str("```\n\n");
    }

    if samples.len() > MAX_SNIPPETS {
        md.push_str(&format!(
            "_...and {} more samples not shown._\n\n",
            samples.len() - MAX_SNIPPETS
        ));
    }
    md
}

fn render_fix(finding: &Finding) -> String {
    let default = default_fix(finding);
    let fix = finding.suggested_fix.as_ref().unwrap_or(&default);

    let mut md = String::from("## How to Fix\n\n");
    md.push_str(&format!("**Goal**: {}\n\n", fix.goal));

    if !fix.steps.is_empty() {
        md.push_str("**Steps**:\n\n");
        for (i, step) in fix.steps.iter().enumerate() {
            md.push_str(&format!("{}. {}\n", i + 1, step));
        }
        md.push('\n');
    }

    if !fix.acceptance.is_empty() {
        md.push_str("**Done when**:\n\n");
        for item in &fix.acceptance {
            md.push_str(&format!("- [ ] {item}\n"));
        }
        md.push('\n');
    }
    md
}

/// Templated remediation plan for findings that arrive without one.
fn default_fix(finding: &Finding) -> SuggestedFix {
    let tool = finding.tool;
    let rule = finding.rule_id.as_str();

    let goal = match (tool, rule) {
        (Tool::Eslint, "no-unused-vars") => {
            "Remove the unused variable or prefix it with an underscore".to_string()
        }
        (Tool::Eslint, "no-eval") => {
            "Replace eval() with a safer alternative such as JSON.parse()".to_string()
        }
        (Tool::Jscpd, _) => "Extract the duplicated block into a shared helper".to_string(),
        (Tool::DependencyCruiser, r) if r.contains("cycle") => {
            "Break the dependency cycle by inverting or extracting one edge".to_string()
        }
        (Tool::Knip, _) => "Delete the unused export, file, or dependency".to_string(),
        (Tool::Bandit, r) if r.contains("hardcoded") => {
            "Move the secret into configuration or a secret store".to_string()
        }
        _ => format!("Resolve {rule} reported by {tool}"),
    };

    SuggestedFix {
        goal,
        steps: vec![
            "Open the location(s) listed above".to_string(),
            "Apply the smallest change that satisfies the rule".to_string(),
            format!("Re-run {tool} locally to confirm the finding is gone"),
        ],
        acceptance: vec![format!(
            "{tool} no longer reports {rule} at the listed locations"
        )],
    }
}

fn render_references(finding: &Finding) -> String {
    let Some(evidence) = finding.evidence.as_ref() else {
        return String::new();
    };
    let links: Vec<&String> = evidence
        .links
        .iter()
        .filter(|l| l.starts_with("http"))
        .collect();
    if links.is_empty() {
        return String::new();
    }

    let mut md = String::from("## References\n\n");
    for link in links {
        md.push_str(&format!("- {link}\n"));
    }
    md.push('\n');
    md
}

fn render_metadata(finding: &Finding, ctx: &RunContext) -> String {
    let short = short_fingerprint(&finding.fingerprint);
    format!(
        "<details>\n<summary>Metadata</summary>\n\n\
         | Field | Value |\n\
         |-------|-------|\n\
         | Fingerprint | `{short}` |\n\
         | Full fingerprint | `{full}` |\n\
         | Commit | [`{commit_short}`]({commit_url}) |\n\
         | Run | {run} |\n\
         | Generated | {timestamp} |\n\
         | Suggested branch | `{branch_prefix}/fix-{short}` |\n\n\
         </details>\n\n",
        short = short,
        full = finding.fingerprint,
        commit_short = ctx.repo.commit_short(),
        commit_url = ctx.repo.commit_url(),
        run = ctx.run_number,
        timestamp = format_timestamp(ctx),
        branch_prefix = ctx.config.branch_prefix,
    )
}
