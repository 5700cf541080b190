//! Run configuration and input loading.
//!
//! The CI scheduler hands this process two JSON documents: the findings
//! feed and a run context (repository coordinates, run number, and the
//! issue-sync configuration). Everything here is plain serde with
//! defaults; malformed input is fatal before any tracker mutation.

use crate::models::{Confidence, RawFinding, Severity};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Issue-sync configuration, normally embedded in the run context.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IssueConfig {
    /// Master switch; a disabled run performs no tracker calls at all.
    pub enabled: bool,
    /// Primary tag every managed issue carries.
    pub label: String,
    /// Cap on issue creations per run.
    pub max_new_per_run: usize,
    /// Minimum severity to report; `info` admits everything.
    pub severity_threshold: Severity,
    /// Minimum confidence to report.
    pub confidence_threshold: Confidence,
    /// Enables flap-protected closure, supersession, and duplicate collapse.
    pub close_resolved: bool,
    /// Users assigned to newly created issues.
    pub assignees: Vec<String>,
    /// Prefix of the suggested fix branch embedded in issue metadata.
    pub branch_prefix: String,
}

impl Default for IssueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            label: "vibeCheck".to_string(),
            max_new_per_run: 25,
            severity_threshold: Severity::Info,
            confidence_threshold: Confidence::Low,
            close_resolved: false,
            assignees: Vec::new(),
            branch_prefix: "vibecheck".to_string(),
        }
    }
}

/// Repository coordinates used for links and tracker routing.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    pub owner: String,
    pub name: String,
    /// Commit the analyzed tree was checked out at.
    pub commit: String,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_host() -> String {
    "github.com".to_string()
}

impl RepoInfo {
    /// Short commit form for display.
    pub fn commit_short(&self) -> &str {
        &self.commit[..self.commit.len().min(7)]
    }

    pub fn blob_url(&self, path: &str, start_line: u32, end_line: Option<u32>) -> String {
        let mut url = format!(
            "https://{}/{}/{}/blob/{}/{}#L{}",
            self.host, self.owner, self.name, self.commit, path, start_line
        );
        if let Some(end) = end_line {
            if end > start_line {
                url.push_str(&format!("-L{end}"));
            }
        }
        url
    }

    pub fn commit_url(&self) -> String {
        format!(
            "https://{}/{}/{}/commit/{}",
            self.host, self.owner, self.name, self.commit
        )
    }
}

/// Everything a single reconciliation run needs to know about itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContext {
    pub repo: RepoInfo,
    pub run_number: u64,
    #[serde(default)]
    pub config: IssueConfig,
    /// Stamped once at load so every rendered body agrees on the time.
    #[serde(skip, default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Load the run context from a JSON file.
pub fn load_run_context(path: &Path) -> Result<RunContext> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read run context: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse run context: {}", path.display()))
}

/// Load the findings feed from a JSON file.
///
/// Accepts either a bare array or an object with a `findings` array.
pub fn load_findings(path: &Path) -> Result<Vec<RawFinding>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read findings file: {}", path.display()))?;
    let parsed: serde_json::Value =
        serde_json::from_str(&text).context("Failed to parse findings file")?;
    let array = match &parsed {
        serde_json::Value::Object(map) => map
            .get("findings")
            .cloned()
            .unwrap_or(serde_json::Value::Array(Vec::new())),
        _ => parsed,
    };
    serde_json::from_value(array).context("Failed to parse findings array")
}
