//! The reconciliation state machine.
//!
//! Matching runs over three indices probed in order: fingerprint (the
//! primary key), then tool/rule parsed from issue titles, then trunk's
//! sublinter name. The fallback tiers recover issues created before the
//! fingerprint markers existed; each is consumed by its first match.

use super::{IssueRef, Op, Plan, FLAP_PROTECTION_RUNS};
use crate::config::IssueConfig;
use crate::models::{ExistingIssue, Finding, Tool};
use crate::render::render_title;
use crate::scoring::meets_thresholds;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::debug;

/// Composite linters trunk hosts; their single-rule issues can be
/// matched by the leading title token.
const TRUNK_SUBLINTERS: &[&str] = &[
    "yamllint",
    "markdownlint",
    "checkov",
    "osv-scanner",
    "prettier",
];

fn leading_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([\w-]+)").expect("valid regex"))
}

fn occurrences_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\(\d+ occurrences\)").expect("valid regex"))
}

fn trailing_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+in\s+\S+(\s+\+\d+\s+more)?$").expect("valid regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Parses `"[<label>] tool: rule ..."` issue titles.
struct TitleMatcher {
    tool_rule_re: Regex,
    label_prefix: String,
}

impl TitleMatcher {
    fn new(label: &str) -> Self {
        let tool_rule_re = Regex::new(&format!(
            r"^\[{}\]\s+([\w-]+):\s*(\S+)",
            regex::escape(label)
        ))
        .expect("valid regex");
        Self {
            tool_rule_re,
            label_prefix: format!("[{}]", label.to_lowercase()),
        }
    }

    /// Extract `(toolLower, ruleLower)` from a managed issue title.
    fn tool_rule(&self, title: &str) -> Option<(String, String)> {
        let caps = self.tool_rule_re.captures(title)?;
        Some((
            caps.get(1)?.as_str().to_lowercase(),
            caps.get(2)?.as_str().to_lowercase(),
        ))
    }

    /// Collapse a title to its identity for duplicate detection:
    /// lowercase, label prefix stripped, occurrence counts and trailing
    /// file hints removed, whitespace collapsed.
    fn normalize_title(&self, title: &str) -> String {
        let lowered = title.to_lowercase();
        let stripped = lowered
            .strip_prefix(&self.label_prefix)
            .unwrap_or(&lowered);
        let no_occurrences = occurrences_re().replace_all(stripped, "");
        let no_file = trailing_file_re().replace(&no_occurrences, "");
        whitespace_re().replace_all(&no_file, " ").trim().to_string()
    }
}

/// First `[\w-]+` token of a finding title; trunk findings lead with
/// their sublinter name.
fn leading_token(title: &str) -> Option<String> {
    leading_token_re()
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Decide the tracker operations for one run.
///
/// Findings must already be deduplicated; the sequence of emitted
/// operations is deterministic given equal inputs.
pub fn plan(
    findings: &[Finding],
    existing: &[ExistingIssue],
    config: &IssueConfig,
    run_number: u64,
) -> Plan {
    let matcher = TitleMatcher::new(&config.label);

    // Layered lookup tables, built in one scan of the existing issues.
    // Issues with a recoverable fingerprint marker are matched by
    // fingerprint alone; only marker-less issues enter the title-based
    // fallback tiers.
    let mut by_fingerprint: HashMap<&str, usize> = HashMap::new();
    let mut by_tool_rule: HashMap<(String, String), usize> = HashMap::new();
    let mut by_sublinter: HashMap<String, usize> = HashMap::new();
    for (i, issue) in existing.iter().enumerate() {
        match &issue.metadata {
            Some(meta) => {
                by_fingerprint.entry(meta.fingerprint.as_str()).or_insert(i);
            }
            None => {
                if let Some((tool, rule)) = matcher.tool_rule(&issue.title) {
                    if TRUNK_SUBLINTERS.contains(&tool.as_str()) {
                        by_sublinter.entry(tool.clone()).or_insert(i);
                    }
                    by_tool_rule.entry((tool, rule)).or_insert(i);
                }
            }
        }
    }

    let admitted: Vec<&Finding> = findings
        .iter()
        .filter(|f| meets_thresholds(f, config.severity_threshold, config.confidence_threshold))
        .collect();
    let skipped_below_threshold = findings.len() - admitted.len();
    if skipped_below_threshold > 0 {
        debug!(
            "{} findings below severity/confidence thresholds",
            skipped_below_threshold
        );
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut ops: Vec<Op> = Vec::new();
    let mut created: Vec<&Finding> = Vec::new();
    let mut updated_titles: HashMap<u64, String> = HashMap::new();
    let mut skipped_max_reached = 0;

    for finding in &admitted {
        seen.insert(finding.fingerprint.as_str());

        let mut matched = by_fingerprint.get(finding.fingerprint.as_str()).copied();
        if matched.is_none() {
            matched = by_tool_rule
                .get(&(finding.tool.to_string(), finding.rule_id.to_lowercase()))
                .copied();
            if matched.is_none() && finding.tool == Tool::Trunk {
                if let Some(token) = leading_token(&finding.title) {
                    matched = by_sublinter.get(&token).copied();
                }
            }
            if let Some(i) = matched {
                // Fallback hit: adopt the issue under the new fingerprint
                // and consume every fallback entry pointing at it, so a
                // second finding this run cannot claim the same issue.
                // First match wins; later colliders fall through to create.
                by_fingerprint.insert(finding.fingerprint.as_str(), i);
                by_tool_rule.retain(|_, index| *index != i);
                by_sublinter.retain(|_, index| *index != i);
            }
        }

        match matched {
            Some(i) if existing[i].is_open() => {
                ops.push(Op::Update {
                    number: existing[i].number,
                    finding: (*finding).clone(),
                });
                updated_titles.insert(
                    existing[i].number,
                    render_title(finding, &config.label),
                );
            }
            Some(_) => {
                // Closed manually or resolved earlier; never reopened.
            }
            None => {
                if created.len() >= config.max_new_per_run {
                    skipped_max_reached += 1;
                } else {
                    ops.push(Op::Create {
                        finding: (*finding).clone(),
                    });
                    created.push(finding);
                }
            }
        }
    }

    if config.close_resolved {
        let mut closed: HashSet<u64> = HashSet::new();

        // (a) Flap-protected closure of issues whose finding disappeared
        for issue in existing.iter().filter(|i| i.is_open()) {
            let Some(meta) = &issue.metadata else { continue };
            if seen.contains(meta.fingerprint.as_str()) {
                continue;
            }
            match meta.last_seen_run {
                Some(last_seen) => {
                    let misses = run_number.saturating_sub(last_seen);
                    if misses >= FLAP_PROTECTION_RUNS {
                        ops.push(Op::Close {
                            number: issue.number,
                            comment: resolved_comment(misses),
                        });
                        closed.insert(issue.number);
                    } else {
                        ops.push(Op::Comment {
                            number: issue.number,
                            body: grace_comment(run_number, FLAP_PROTECTION_RUNS - misses),
                        });
                    }
                }
                // No readable run marker: warn the issue, never auto-close
                None => ops.push(Op::Comment {
                    number: issue.number,
                    body: grace_comment(run_number, FLAP_PROTECTION_RUNS),
                }),
            }
        }

        // (b) Supersession: single-rule issues folded into a merged report
        for issue in existing.iter().filter(|i| i.is_open()) {
            if closed.contains(&issue.number) {
                continue;
            }
            if let Some(meta) = &issue.metadata {
                if seen.contains(meta.fingerprint.as_str()) {
                    continue;
                }
            }
            let Some((token, _)) = matcher.tool_rule(&issue.title) else {
                continue;
            };
            let superseded = admitted.iter().any(|f| {
                f.tool == Tool::Trunk
                    && leading_token(&f.title).as_deref() == Some(token.as_str())
                    && f.is_merged()
            });
            if superseded {
                ops.push(Op::Close {
                    number: issue.number,
                    comment: supersession_comment(&token),
                });
                closed.insert(issue.number);
            }
        }

        // (c) Duplicate collapse by normalized title; highest number wins
        let mut entries: Vec<(IssueRef, String)> = Vec::new();
        for issue in existing.iter().filter(|i| i.is_open()) {
            if closed.contains(&issue.number) {
                continue;
            }
            let title = updated_titles
                .get(&issue.number)
                .cloned()
                .unwrap_or_else(|| issue.title.clone());
            entries.push((IssueRef::Existing(issue.number), title));
        }
        for (index, finding) in created.iter().enumerate() {
            entries.push((
                IssueRef::Created(index),
                render_title(finding, &config.label),
            ));
        }

        let mut groups: Vec<Vec<IssueRef>> = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();
        for (issue_ref, title) in entries {
            let key = matcher.normalize_title(&title);
            match group_index.get(&key) {
                Some(&g) => groups[g].push(issue_ref),
                None => {
                    group_index.insert(key, groups.len());
                    groups.push(vec![issue_ref]);
                }
            }
        }
        for mut members in groups {
            if members.len() < 2 {
                continue;
            }
            members.sort_by_key(|r| std::cmp::Reverse(r.rank()));
            let canonical = members[0].clone();
            for member in members.into_iter().skip(1) {
                ops.push(Op::CloseDuplicate {
                    issue: member,
                    canonical: canonical.clone(),
                });
            }
        }
    }

    Plan {
        ops,
        skipped_below_threshold,
        skipped_max_reached,
    }
}

fn resolved_comment(misses: u64) -> String {
    format!(
        "✅ This finding has not been detected for {misses} consecutive runs \
         and is considered resolved. Closing."
    )
}

fn grace_comment(run_number: u64, remaining: u64) -> String {
    let runs = if remaining == 1 { "run" } else { "runs" };
    format!(
        "This finding was not detected in run {run_number}. The issue will be \
         closed automatically after {remaining} more consecutive {runs} without \
         a detection."
    )
}

fn supersession_comment(sublinter: &str) -> String {
    format!(
        "Superseded by the consolidated {sublinter} report, which now covers \
         this rule. Closing in favor of the merged issue."
    )
}
