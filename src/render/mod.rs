//! Deterministic issue rendering: titles, bodies, labels, markers.
//!
//! Everything here is a pure function of the finding and run context.
//! Byte-identical output on every call is what makes updates idempotent.

pub mod body;
pub mod markers;
pub mod rules;
pub mod title;

pub use body::render_body;
pub use title::render_title;

use crate::config::IssueConfig;
use crate::dedup::is_test_fixture_path;
use crate::models::{Autofix, Finding};

/// The full label set an issue carries for a finding.
pub fn issue_labels(finding: &Finding, config: &IssueConfig) -> Vec<String> {
    let mut labels = vec![
        config.label.clone(),
        format!("severity:{}", finding.severity),
        format!("confidence:{}", finding.confidence),
        format!("effort:{}", finding.effort.to_string().to_lowercase()),
        format!("layer:{}", finding.layer),
        format!("tool:{}", finding.tool),
    ];
    if finding.autofix == Autofix::Safe {
        labels.push("autofix:safe".to_string());
    }
    if finding
        .locations
        .iter()
        .any(|l| is_test_fixture_path(&l.path))
    {
        labels.push("demo".to_string());
    }
    labels
}
