//! Core data models for vibecheck-sync
//!
//! These models are used throughout the codebase for representing
//! normalized findings, tracker issues, and run statistics.

use serde::{Deserialize, Serialize};

/// Severity levels for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Confidence that a finding is a true positive
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Fix-size estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Effort {
    S,
    #[default]
    M,
    L,
}

impl std::fmt::Display for Effort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effort::S => write!(f, "S"),
            Effort::M => write!(f, "M"),
            Effort::L => write!(f, "L"),
        }
    }
}

/// Concern area of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Security,
    Architecture,
    #[default]
    Code,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Security => write!(f, "security"),
            Layer::Architecture => write!(f, "architecture"),
            Layer::Code => write!(f, "code"),
        }
    }
}

/// Whether the reporting tool can fix the finding mechanically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Autofix {
    Safe,
    RequiresReview,
    #[default]
    None,
}

impl std::fmt::Display for Autofix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Autofix::Safe => write!(f, "safe"),
            Autofix::RequiresReview => write!(f, "requires_review"),
            Autofix::None => write!(f, "none"),
        }
    }
}

/// Analysis tools whose output this system ingests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    Trunk,
    Eslint,
    Prettier,
    Tsc,
    Jscpd,
    DependencyCruiser,
    Knip,
    Semgrep,
    Ruff,
    Mypy,
    Bandit,
    Pmd,
    Spotbugs,
}

impl Tool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Trunk => "trunk",
            Tool::Eslint => "eslint",
            Tool::Prettier => "prettier",
            Tool::Tsc => "tsc",
            Tool::Jscpd => "jscpd",
            Tool::DependencyCruiser => "dependency-cruiser",
            Tool::Knip => "knip",
            Tool::Semgrep => "semgrep",
            Tool::Ruff => "ruff",
            Tool::Mypy => "mypy",
            Tool::Bandit => "bandit",
            Tool::Pmd => "pmd",
            Tool::Spotbugs => "spotbugs",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single source location attached to a finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub path: String,
    pub start_line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
}

impl Location {
    pub fn new(path: impl Into<String>, start_line: u32) -> Self {
        Self {
            path: path.into(),
            start_line,
            end_line: None,
        }
    }

    /// File name portion of the path, for compact display.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Supporting evidence attached by the analyzer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

/// A concrete remediation plan for a finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedFix {
    pub goal: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub acceptance: Vec<String>,
}

/// One analyzer report as it arrives on the input feed, before scoring.
///
/// Tool-native fields (`severity`, `confidence`, `rank`, `priority`, ...)
/// are carried as loose strings/numbers; the scoring tables in
/// [`crate::scoring`] map them onto the normalized enums.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFinding {
    pub tool: Tool,
    pub rule_id: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub locations: Vec<Location>,
    /// Tool-native severity (bandit `HIGH`, eslint `error`, semgrep `ERROR`, ...)
    #[serde(default)]
    pub severity: Option<String>,
    /// Tool-native confidence (`HIGH`/`MEDIUM`/`LOW`, spotbugs `1`/`2`/`3`, ...)
    #[serde(default)]
    pub confidence: Option<String>,
    /// jscpd: duplicated line count
    #[serde(default)]
    pub lines: Option<u32>,
    /// jscpd: duplicated token count
    #[serde(default)]
    pub tokens: Option<u32>,
    /// spotbugs: bug rank, 1 (worst) to 20
    #[serde(default)]
    pub rank: Option<u32>,
    /// spotbugs: bug category (SECURITY, CORRECTNESS, ...)
    #[serde(default)]
    pub category: Option<String>,
    /// pmd: rule priority, 1 (worst) to 5
    #[serde(default)]
    pub priority: Option<u32>,
    /// pmd: ruleset the rule belongs to (errorprone, design, ...)
    #[serde(default)]
    pub ruleset: Option<String>,
    /// mypy: error code when it differs from the rule id
    #[serde(default)]
    pub code: Option<String>,
    /// The tool reported an automatic fix for this finding
    #[serde(default)]
    pub fix: bool,
    #[serde(default)]
    pub evidence: Option<Evidence>,
    #[serde(default)]
    pub suggested_fix: Option<SuggestedFix>,
}

/// A normalized, scored, fingerprinted finding. Immutable after construction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub tool: Tool,
    /// Tool-scoped rule id; merged rule clusters use the plus-joined form `A+B+C`
    pub rule_id: String,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub effort: Effort,
    pub layer: Layer,
    pub autofix: Autofix,
    /// Non-empty; the first entry is the canonical location
    pub locations: Vec<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<SuggestedFix>,
    /// `sha256:<hex>` content identity, stable across minor code drift
    pub fingerprint: String,
}

impl Finding {
    pub fn canonical_location(&self) -> &Location {
        &self.locations[0]
    }

    /// Whether this finding consolidates a cluster of single-rule findings.
    pub fn is_merged(&self) -> bool {
        self.rule_id.contains('+')
            || self.title.contains("issues across")
            || self.title.contains("occurrences)")
    }
}

/// Open/closed state of a tracker issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// Machine-readable state recovered from an issue body's hidden markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueMetadata {
    /// Full `sha256:<hex>` fingerprint of the finding the issue tracks
    pub fingerprint: String,
    /// Run number of the last run that observed the finding
    pub last_seen_run: Option<u64>,
}

/// The tracker's view of an issue this system manages
#[derive(Debug, Clone)]
pub struct ExistingIssue {
    pub number: u64,
    pub state: IssueState,
    pub title: String,
    pub labels: Vec<String>,
    pub metadata: Option<IssueMetadata>,
}

impl ExistingIssue {
    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }
}

/// Per-run reconciliation statistics, written to stdout as the run's result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub closed: usize,
    pub skipped_below_threshold: usize,
    pub skipped_duplicate: usize,
    pub skipped_max_reached: usize,
}
