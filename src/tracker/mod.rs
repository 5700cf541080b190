//! Issue tracker port.
//!
//! The reconciler only ever talks to this trait; the live GitHub adapter
//! and the in-memory test tracker both implement it. Abstracting the
//! tracker keeps the state machine deterministic and testable without
//! HTTP.

pub mod github;
pub mod rate_limit;

pub use github::GitHubTracker;
pub use rate_limit::RateLimiter;

use crate::config::IssueConfig;
use crate::models::{Confidence, Effort, ExistingIssue, Layer, Severity, Tool};
use thiserror::Error;

/// Errors surfaced by tracker adapters
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited (status {status})")]
    RateLimited {
        status: u16,
        /// Server-suggested wait, seconds
        retry_after: Option<u64>,
    },

    #[error("transient tracker error: {status} - {message}")]
    Transient { status: u16, message: String },

    #[error("permanent tracker error: {status} - {message}")]
    Permanent { status: u16, message: String },

    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<TrackerError>,
    },

    #[error("failed to parse tracker response: {0}")]
    Parse(String),

    #[error("missing tracker token: {0} not set")]
    MissingToken(String),
}

impl TrackerError {
    /// Whether the rate limiter should retry the call.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TrackerError::Transport(_)
                | TrackerError::RateLimited { .. }
                | TrackerError::Transient { .. }
        )
    }
}

/// A label definition to ensure exists before issues reference it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub name: String,
    pub color: &'static str,
    pub description: String,
}

/// Request to create an issue
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
}

/// Request to update an issue in place
#[derive(Debug, Clone)]
pub struct IssueUpdate {
    pub number: u64,
    pub title: Option<String>,
    pub body: Option<String>,
    pub labels: Option<Vec<String>>,
}

/// Capability set the reconciler consumes. One method per tracker call;
/// every call is a blocking I/O operation and a cancellation point.
pub trait Tracker {
    /// Idempotently create label definitions.
    fn ensure_labels(&self, specs: &[LabelSpec]) -> Result<(), TrackerError>;

    /// All issues (any state) bearing every given label.
    fn search_issues_by_label(&self, labels: &[String])
        -> Result<Vec<ExistingIssue>, TrackerError>;

    /// Create an issue, returning its number.
    fn create_issue(&self, issue: &NewIssue) -> Result<u64, TrackerError>;

    /// Update title/body/labels of an existing issue.
    fn update_issue(&self, update: &IssueUpdate) -> Result<(), TrackerError>;

    /// Close an issue, optionally commenting first.
    fn close_issue(&self, number: u64, comment: Option<&str>) -> Result<(), TrackerError>;

    /// Add a comment to an issue.
    fn add_issue_comment(&self, number: u64, body: &str) -> Result<(), TrackerError>;
}

/// Every label this system can attach, with colors and descriptions.
pub fn label_specs(config: &IssueConfig) -> Vec<LabelSpec> {
    let mut specs = vec![LabelSpec {
        name: config.label.clone(),
        color: "6f42c1",
        description: "Managed by vibecheck-sync".to_string(),
    }];

    for severity in [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ] {
        specs.push(LabelSpec {
            name: format!("severity:{severity}"),
            color: match severity {
                Severity::Critical => "b60205",
                Severity::High => "d93f0b",
                Severity::Medium => "fbca04",
                Severity::Low => "1d76db",
                Severity::Info => "c5def5",
            },
            description: format!("Finding severity: {severity}"),
        });
    }

    for confidence in [Confidence::High, Confidence::Medium, Confidence::Low] {
        specs.push(LabelSpec {
            name: format!("confidence:{confidence}"),
            color: "bfd4f2",
            description: format!("Detection confidence: {confidence}"),
        });
    }

    for effort in [Effort::S, Effort::M, Effort::L] {
        specs.push(LabelSpec {
            name: format!("effort:{}", effort.to_string().to_lowercase()),
            color: "ededed",
            description: format!("Estimated fix effort: {effort}"),
        });
    }

    for layer in [Layer::Security, Layer::Architecture, Layer::Code] {
        specs.push(LabelSpec {
            name: format!("layer:{layer}"),
            color: match layer {
                Layer::Security => "b60205",
                Layer::Architecture => "1d76db",
                Layer::Code => "bfdadc",
            },
            description: format!("Concern area: {layer}"),
        });
    }

    for tool in [
        Tool::Trunk,
        Tool::Eslint,
        Tool::Prettier,
        Tool::Tsc,
        Tool::Jscpd,
        Tool::DependencyCruiser,
        Tool::Knip,
        Tool::Semgrep,
        Tool::Ruff,
        Tool::Mypy,
        Tool::Bandit,
        Tool::Pmd,
        Tool::Spotbugs,
    ] {
        specs.push(LabelSpec {
            name: format!("tool:{tool}"),
            color: "ededed",
            description: format!("Reported by {tool}"),
        });
    }

    specs.push(LabelSpec {
        name: "autofix:safe".to_string(),
        color: "0e8a16",
        description: "A mechanical fix is available".to_string(),
    });
    specs.push(LabelSpec {
        name: "demo".to_string(),
        color: "f9d0c4",
        description: "Located in demo/fixture code".to_string(),
    });

    specs
}
