//! Scoring and classification of raw analyzer output.
//!
//! Pure, total functions mapping tool-native severity, confidence, and
//! metrics onto the normalized enums. Every analyzer gets its own table;
//! tools that already report normalized values (semgrep, trunk) pass them
//! through with conservative defaults.

mod autofix;
mod effort;
mod layer;

pub use autofix::autofix_level;
pub use effort::estimate_effort;
pub use layer::classify_layer;

use crate::fingerprint;
use crate::models::{Confidence, Finding, RawFinding, Severity, Tool};
use anyhow::{ensure, Result};
use std::cmp::Ordering;

/// Map tool-native severity and confidence onto the normalized scales.
pub fn severity_confidence(raw: &RawFinding) -> (Severity, Confidence) {
    match raw.tool {
        Tool::Tsc => (Severity::High, Confidence::High),

        Tool::Jscpd => {
            let lines = raw.lines.unwrap_or(0);
            let tokens = raw.tokens.unwrap_or(0);
            let severity = if lines >= 50 || tokens >= 500 {
                Severity::High
            } else if lines >= 20 || tokens >= 200 {
                Severity::Medium
            } else {
                Severity::Low
            };
            (severity, Confidence::High)
        }

        Tool::DependencyCruiser => {
            let rule = raw.rule_id.to_lowercase();
            if rule.contains("cycle") || rule.contains("not-allowed") || rule.contains("forbidden")
            {
                (Severity::High, Confidence::High)
            } else if rule.contains("orphan") || rule.contains("reachable") {
                (Severity::Medium, Confidence::Medium)
            } else {
                (Severity::Medium, Confidence::Medium)
            }
        }

        Tool::Knip => match raw.rule_id.as_str() {
            "dependencies" | "devDependencies" => (Severity::High, Confidence::High),
            "exports" => (Severity::Medium, Confidence::Medium),
            "files" => (Severity::Medium, Confidence::High),
            _ => (Severity::Medium, Confidence::Medium),
        },

        // Semgrep and trunk report normalized values where available
        Tool::Semgrep | Tool::Trunk => (
            raw.severity
                .as_deref()
                .and_then(parse_severity)
                .unwrap_or(Severity::Medium),
            raw.confidence
                .as_deref()
                .and_then(parse_confidence)
                .unwrap_or(Confidence::Medium),
        ),

        Tool::Ruff => ruff_severity(&raw.rule_id),

        Tool::Mypy => {
            let code = raw.code.as_deref().unwrap_or(&raw.rule_id).to_lowercase();
            let severity = if code.contains("import") {
                Severity::Medium
            } else if code == "note" {
                Severity::Low
            } else {
                Severity::High
            };
            (severity, Confidence::High)
        }

        Tool::Bandit => {
            let severity = match raw.severity.as_deref().map(str::to_uppercase).as_deref() {
                Some("HIGH") => Severity::Critical,
                Some("MEDIUM") => Severity::High,
                Some("LOW") => Severity::Medium,
                _ => Severity::Medium,
            };
            let confidence = raw
                .confidence
                .as_deref()
                .and_then(parse_confidence)
                .unwrap_or(Confidence::Medium);
            (severity, confidence)
        }

        Tool::Pmd => {
            let severity = match raw.priority.unwrap_or(3) {
                1 => Severity::Critical,
                2 => Severity::High,
                3 => Severity::Medium,
                _ => Severity::Low,
            };
            let ruleset = raw.ruleset.as_deref().unwrap_or("").to_lowercase();
            let confidence = if ruleset.contains("errorprone") {
                Confidence::High
            } else if ruleset.contains("security") || ruleset.contains("bestpractices") {
                Confidence::Medium
            } else if ruleset.contains("design") || ruleset.contains("codestyle") {
                Confidence::Low
            } else {
                Confidence::Medium
            };
            (severity, confidence)
        }

        Tool::Spotbugs => spotbugs_severity(raw),

        Tool::Eslint => {
            let severity = match raw.severity.as_deref() {
                Some("error") | Some("2") => Severity::Medium,
                Some("warning") | Some("1") => Severity::Low,
                _ => Severity::Low,
            };
            (severity, Confidence::High)
        }

        Tool::Prettier => (Severity::Low, Confidence::High),
    }
}

/// Ruff severities are keyed on the rule-code prefix.
fn ruff_severity(rule_id: &str) -> (Severity, Confidence) {
    let rule = rule_id.to_uppercase();
    let prefix: String = rule.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &rule[prefix.len()..];

    if prefix == "E" && digits.starts_with('9') {
        // E9xx are syntax/runtime errors
        (Severity::Critical, Confidence::High)
    } else if prefix == "F" && (digits.starts_with('4') || digits.starts_with('8')) {
        (Severity::High, Confidence::High)
    } else if prefix == "S" {
        (Severity::High, Confidence::Medium)
    } else if prefix == "E" || prefix == "F" {
        (Severity::High, Confidence::High)
    } else if prefix == "W" {
        (Severity::Medium, Confidence::Medium)
    } else if prefix == "N" || prefix == "D" {
        (Severity::Low, Confidence::Low)
    } else if prefix == "C" {
        (Severity::Low, Confidence::Medium)
    } else if prefix == "B" {
        (Severity::Medium, Confidence::Medium)
    } else {
        (Severity::Medium, Confidence::Medium)
    }
}

/// SpotBugs ranks run 1 (worst) to 20; category sharpens the banding.
fn spotbugs_severity(raw: &RawFinding) -> (Severity, Confidence) {
    let rank = raw.rank.unwrap_or(20);
    let category = raw.category.as_deref().unwrap_or("").to_uppercase();

    let severity = match category.as_str() {
        "SECURITY" => {
            if rank <= 4 {
                Severity::Critical
            } else {
                Severity::High
            }
        }
        "CORRECTNESS" => {
            if rank <= 4 {
                Severity::Critical
            } else if rank <= 9 {
                Severity::High
            } else {
                Severity::Medium
            }
        }
        _ => {
            if rank <= 4 {
                Severity::Critical
            } else if rank <= 9 {
                Severity::High
            } else if rank <= 14 {
                Severity::Medium
            } else {
                Severity::Low
            }
        }
    };

    let confidence = match raw.confidence.as_deref() {
        Some("1") => Confidence::High,
        Some("2") => Confidence::Medium,
        Some("3") => Confidence::Low,
        other => other.and_then(parse_confidence).unwrap_or(Confidence::Medium),
    };
    (severity, confidence)
}

fn parse_severity(value: &str) -> Option<Severity> {
    match value.to_lowercase().as_str() {
        "critical" => Some(Severity::Critical),
        "high" | "error" => Some(Severity::High),
        "medium" | "warning" => Some(Severity::Medium),
        "low" | "info" | "note" => Some(Severity::Low),
        _ => None,
    }
}

fn parse_confidence(value: &str) -> Option<Confidence> {
    match value.to_lowercase().as_str() {
        "high" => Some(Confidence::High),
        "medium" => Some(Confidence::Medium),
        "low" => Some(Confidence::Low),
        _ => None,
    }
}

/// Score, classify, and fingerprint one raw finding.
///
/// # Errors
///
/// Fails when the finding carries no locations; the canonical location is
/// required for fingerprinting.
pub fn normalize(raw: RawFinding) -> Result<Finding> {
    ensure!(
        !raw.locations.is_empty(),
        "finding {}:{} has no locations",
        raw.tool,
        raw.rule_id
    );

    let (severity, confidence) = severity_confidence(&raw);
    let layer = classify_layer(raw.tool, &raw.rule_id);
    let effort = estimate_effort(raw.tool, &raw.rule_id, raw.locations.len(), raw.fix);
    let autofix = autofix_level(raw.tool, &raw.rule_id, raw.fix);

    let canonical = &raw.locations[0];
    let fingerprint = fingerprint::fingerprint(
        raw.tool,
        &raw.rule_id,
        &canonical.path,
        canonical.start_line,
        &raw.message,
    );

    Ok(Finding {
        tool: raw.tool,
        rule_id: raw.rule_id,
        title: raw.title,
        message: raw.message,
        severity,
        confidence,
        effort,
        layer,
        autofix,
        locations: raw.locations,
        evidence: raw.evidence,
        suggested_fix: raw.suggested_fix,
        fingerprint,
    })
}

/// Whether a finding clears the configured reporting thresholds.
///
/// An `info` severity threshold admits every severity.
pub fn meets_thresholds(
    finding: &Finding,
    severity_threshold: Severity,
    confidence_threshold: Confidence,
) -> bool {
    finding.severity >= severity_threshold && finding.confidence >= confidence_threshold
}

/// Total order used to sequence findings before reconciliation:
/// severity desc, confidence desc, canonical path asc, start line asc,
/// with rule id and fingerprint as final tie-breakers.
pub fn compare_findings_for_sort(a: &Finding, b: &Finding) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| b.confidence.cmp(&a.confidence))
        .then_with(|| a.canonical_location().path.cmp(&b.canonical_location().path))
        .then_with(|| {
            a.canonical_location()
                .start_line
                .cmp(&b.canonical_location().start_line)
        })
        .then_with(|| a.rule_id.cmp(&b.rule_id))
        .then_with(|| a.fingerprint.cmp(&b.fingerprint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;

    pub(super) fn raw(tool: Tool, rule_id: &str) -> RawFinding {
        RawFinding {
            tool,
            rule_id: rule_id.to_string(),
            title: format!("{tool}: {rule_id}"),
            message: "test message".to_string(),
            locations: vec![Location::new("src/a.ts", 42)],
            severity: None,
            confidence: None,
            lines: None,
            tokens: None,
            rank: None,
            category: None,
            priority: None,
            ruleset: None,
            code: None,
            fix: false,
            evidence: None,
            suggested_fix: None,
        }
    }

    #[test]
    fn test_tsc_always_high() {
        assert_eq!(
            severity_confidence(&raw(Tool::Tsc, "TS2345")),
            (Severity::High, Confidence::High)
        );
    }

    #[test]
    fn test_jscpd_size_bands() {
        let mut r = raw(Tool::Jscpd, "duplicate-code");
        r.lines = Some(60);
        assert_eq!(severity_confidence(&r).0, Severity::High);
        r.lines = Some(10);
        r.tokens = Some(500);
        assert_eq!(severity_confidence(&r).0, Severity::High);
        r.tokens = Some(250);
        assert_eq!(severity_confidence(&r).0, Severity::Medium);
        r.lines = Some(5);
        r.tokens = Some(50);
        assert_eq!(severity_confidence(&r).0, Severity::Low);
        assert_eq!(severity_confidence(&r).1, Confidence::High);
    }

    #[test]
    fn test_dependency_cruiser_rules() {
        assert_eq!(
            severity_confidence(&raw(Tool::DependencyCruiser, "no-cycle")),
            (Severity::High, Confidence::High)
        );
        assert_eq!(
            severity_confidence(&raw(Tool::DependencyCruiser, "no-orphans")),
            (Severity::Medium, Confidence::Medium)
        );
    }

    #[test]
    fn test_knip_rules() {
        assert_eq!(
            severity_confidence(&raw(Tool::Knip, "dependencies")),
            (Severity::High, Confidence::High)
        );
        assert_eq!(
            severity_confidence(&raw(Tool::Knip, "exports")),
            (Severity::Medium, Confidence::Medium)
        );
        assert_eq!(
            severity_confidence(&raw(Tool::Knip, "files")),
            (Severity::Medium, Confidence::High)
        );
    }

    #[test]
    fn test_semgrep_pass_through_and_default() {
        let mut r = raw(Tool::Semgrep, "javascript.lang.security.audit.xss");
        assert_eq!(
            severity_confidence(&r),
            (Severity::Medium, Confidence::Medium)
        );
        r.severity = Some("ERROR".to_string());
        r.confidence = Some("HIGH".to_string());
        assert_eq!(severity_confidence(&r), (Severity::High, Confidence::High));
    }

    #[test]
    fn test_ruff_prefixes() {
        assert_eq!(
            severity_confidence(&raw(Tool::Ruff, "E902")),
            (Severity::Critical, Confidence::High)
        );
        assert_eq!(
            severity_confidence(&raw(Tool::Ruff, "F401")),
            (Severity::High, Confidence::High)
        );
        assert_eq!(
            severity_confidence(&raw(Tool::Ruff, "F841")),
            (Severity::High, Confidence::High)
        );
        assert_eq!(
            severity_confidence(&raw(Tool::Ruff, "S101")),
            (Severity::High, Confidence::Medium)
        );
        assert_eq!(
            severity_confidence(&raw(Tool::Ruff, "E501")),
            (Severity::High, Confidence::High)
        );
        assert_eq!(severity_confidence(&raw(Tool::Ruff, "W291")).0, Severity::Medium);
        assert_eq!(
            severity_confidence(&raw(Tool::Ruff, "N801")),
            (Severity::Low, Confidence::Low)
        );
        assert_eq!(
            severity_confidence(&raw(Tool::Ruff, "D100")),
            (Severity::Low, Confidence::Low)
        );
        assert_eq!(severity_confidence(&raw(Tool::Ruff, "C901")).0, Severity::Low);
        assert_eq!(severity_confidence(&raw(Tool::Ruff, "B008")).0, Severity::Medium);
    }

    #[test]
    fn test_mypy_code_bands() {
        let mut r = raw(Tool::Mypy, "arg-type");
        assert_eq!(severity_confidence(&r), (Severity::High, Confidence::High));
        r.code = Some("import-untyped".to_string());
        assert_eq!(severity_confidence(&r).0, Severity::Medium);
        r.code = Some("note".to_string());
        assert_eq!(severity_confidence(&r).0, Severity::Low);
    }

    #[test]
    fn test_bandit_mapping() {
        let mut r = raw(Tool::Bandit, "B608");
        r.severity = Some("HIGH".to_string());
        r.confidence = Some("MEDIUM".to_string());
        assert_eq!(
            severity_confidence(&r),
            (Severity::Critical, Confidence::Medium)
        );
        r.severity = Some("MEDIUM".to_string());
        assert_eq!(severity_confidence(&r).0, Severity::High);
        r.severity = Some("LOW".to_string());
        r.confidence = Some("LOW".to_string());
        assert_eq!(severity_confidence(&r), (Severity::Medium, Confidence::Low));
    }

    #[test]
    fn test_pmd_priority_and_ruleset() {
        let mut r = raw(Tool::Pmd, "AvoidCatchingThrowable");
        r.priority = Some(1);
        r.ruleset = Some("errorprone".to_string());
        assert_eq!(
            severity_confidence(&r),
            (Severity::Critical, Confidence::High)
        );
        r.priority = Some(2);
        r.ruleset = Some("security".to_string());
        assert_eq!(severity_confidence(&r), (Severity::High, Confidence::Medium));
        r.priority = Some(4);
        r.ruleset = Some("codestyle".to_string());
        assert_eq!(severity_confidence(&r), (Severity::Low, Confidence::Low));
        r.priority = Some(5);
        assert_eq!(severity_confidence(&r).0, Severity::Low);
    }

    #[test]
    fn test_spotbugs_bands() {
        let mut r = raw(Tool::Spotbugs, "SQL_INJECTION_JDBC");
        r.category = Some("SECURITY".to_string());
        r.rank = Some(3);
        r.confidence = Some("1".to_string());
        assert_eq!(
            severity_confidence(&r),
            (Severity::Critical, Confidence::High)
        );
        r.rank = Some(10);
        assert_eq!(severity_confidence(&r).0, Severity::High);

        r.category = Some("CORRECTNESS".to_string());
        r.rank = Some(8);
        r.confidence = Some("2".to_string());
        assert_eq!(severity_confidence(&r), (Severity::High, Confidence::Medium));
        r.rank = Some(12);
        assert_eq!(severity_confidence(&r).0, Severity::Medium);

        r.category = Some("STYLE".to_string());
        r.rank = Some(12);
        r.confidence = Some("3".to_string());
        assert_eq!(severity_confidence(&r), (Severity::Medium, Confidence::Low));
        r.rank = Some(18);
        assert_eq!(severity_confidence(&r).0, Severity::Low);
    }

    #[test]
    fn test_normalize_rejects_empty_locations() {
        let mut r = raw(Tool::Eslint, "no-unused-vars");
        r.locations.clear();
        assert!(normalize(r).is_err());
    }

    #[test]
    fn test_normalize_produces_fingerprint() {
        let f = normalize(raw(Tool::Eslint, "no-unused-vars")).unwrap();
        assert!(f.fingerprint.starts_with("sha256:"));
        assert_eq!(f.severity, Severity::Low);
        assert_eq!(f.confidence, Confidence::High);
    }

    #[test]
    fn test_thresholds_info_admits_all() {
        let f = normalize(raw(Tool::Ruff, "D100")).unwrap();
        assert!(meets_thresholds(&f, Severity::Info, Confidence::Low));
        assert!(!meets_thresholds(&f, Severity::Medium, Confidence::Low));
        assert!(!meets_thresholds(&f, Severity::Info, Confidence::Medium));
    }

    #[test]
    fn test_sort_order_is_total() {
        let mut findings = vec![
            normalize(raw(Tool::Ruff, "D100")).unwrap(),
            normalize(raw(Tool::Tsc, "TS2345")).unwrap(),
            normalize(raw(Tool::Ruff, "E902")).unwrap(),
        ];
        findings.sort_by(compare_findings_for_sort);
        assert_eq!(findings[0].rule_id, "E902");
        assert_eq!(findings[1].rule_id, "TS2345");
        assert_eq!(findings[2].rule_id, "D100");

        // Antisymmetry on distinct findings
        let a = &findings[0];
        let b = &findings[1];
        assert_eq!(
            compare_findings_for_sort(a, b),
            compare_findings_for_sort(b, a).reverse()
        );
    }
}
