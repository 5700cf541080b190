//! Hidden issue-body markers.
//!
//! The tracker is the only datastore this system has; the fingerprint and
//! last-seen-run markers embedded in every issue body carry all cross-run
//! state. The anchor tokens are fixed: they must survive a create/read/
//! update cycle byte-for-byte, and they deliberately do not include the
//! configurable label so a label rename cannot orphan existing issues.

use crate::models::IssueMetadata;
use regex::Regex;
use std::sync::OnceLock;

fn fingerprint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<!-- vibecheck-fingerprint: (sha256:[0-9a-f]+) -->").expect("valid regex")
    })
}

fn run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<!-- vibecheck-run: runNumber=(\d+) timestamp=(\S+) -->")
            .expect("valid regex")
    })
}

/// Render the fingerprint marker line.
pub fn fingerprint_marker(fingerprint: &str) -> String {
    format!("<!-- vibecheck-fingerprint: {fingerprint} -->")
}

/// Render the run-metadata marker line.
pub fn run_marker(run_number: u64, timestamp: &str) -> String {
    format!("<!-- vibecheck-run: runNumber={run_number} timestamp={timestamp} -->")
}

/// Recover machine-readable metadata from an issue body.
///
/// Absent or mangled markers degrade to `None` / partial metadata; parse
/// problems here must never fail the reconciler.
pub fn parse_metadata(body: &str) -> Option<IssueMetadata> {
    let fingerprint = fingerprint_re()
        .captures(body)?
        .get(1)?
        .as_str()
        .to_string();
    let last_seen_run = run_re()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());
    Some(IssueMetadata {
        fingerprint,
        last_seen_run,
    })
}
