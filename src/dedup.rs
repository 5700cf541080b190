//! Finding deduplication.
//!
//! Findings sharing a fingerprint are collapsed into one aggregate
//! carrying the union of their locations. Input order of first
//! occurrence is preserved so the reconciler stays deterministic.

use crate::models::Finding;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Path components that mark intentionally-broken demo/fixture code.
const FIXTURE_COMPONENTS: &[&str] = &["test-fixtures", "fixtures", "__fixtures__", "testdata"];

/// Collapse findings sharing a fingerprint. Returns the deduplicated list
/// and the number of collapsed members (the run's `skippedDuplicate`).
pub fn dedup_findings(findings: Vec<Finding>) -> (Vec<Finding>, usize) {
    let total = findings.len();
    let mut result: Vec<Finding> = Vec::with_capacity(total);
    let mut index: HashMap<String, usize> = HashMap::new();
    // Parallel to `result`: the (path, startLine) pairs already present
    let mut seen_locations: Vec<HashSet<(String, u32)>> = Vec::with_capacity(total);

    for finding in findings {
        match index.get(&finding.fingerprint) {
            Some(&i) => {
                for location in finding.locations {
                    if seen_locations[i].insert((location.path.clone(), location.start_line)) {
                        result[i].locations.push(location);
                    }
                }
            }
            None => {
                index.insert(finding.fingerprint.clone(), result.len());
                let mut seen = HashSet::new();
                let mut kept = finding;
                kept.locations
                    .retain(|l| seen.insert((l.path.clone(), l.start_line)));
                seen_locations.push(seen);
                result.push(kept);
            }
        }
    }

    let collapsed = total - result.len();
    if collapsed > 0 {
        debug!("Collapsed {} duplicate findings", collapsed);
    }
    (result, collapsed)
}

/// Whether a path points into demo/fixture code that is analyzed on
/// purpose. Such findings are kept but tagged with the `demo` label.
pub fn is_test_fixture_path(path: &str) -> bool {
    let lowered = path.to_lowercase();
    lowered
        .split(['/', '\\'])
        .any(|component| FIXTURE_COMPONENTS.contains(&component))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Autofix, Confidence, Effort, Layer, Location, Severity, Tool};

    fn finding(fingerprint: &str, locations: Vec<Location>) -> Finding {
        Finding {
            tool: Tool::Eslint,
            rule_id: "no-unused-vars".to_string(),
            title: "eslint: no-unused-vars".to_string(),
            message: "unused".to_string(),
            severity: Severity::Medium,
            confidence: Confidence::High,
            effort: Effort::S,
            layer: Layer::Code,
            autofix: Autofix::None,
            locations,
            evidence: None,
            suggested_fix: None,
            fingerprint: fingerprint.to_string(),
        }
    }

    #[test]
    fn test_dedup_unions_locations() {
        let (deduped, collapsed) = dedup_findings(vec![
            finding("sha256:aa", vec![Location::new("src/a.ts", 1)]),
            finding("sha256:bb", vec![Location::new("src/b.ts", 2)]),
            finding(
                "sha256:aa",
                vec![Location::new("src/a.ts", 1), Location::new("src/c.ts", 3)],
            ),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(collapsed, 1);
        assert_eq!(deduped[0].fingerprint, "sha256:aa");
        assert_eq!(
            deduped[0]
                .locations
                .iter()
                .map(|l| l.path.as_str())
                .collect::<Vec<_>>(),
            vec!["src/a.ts", "src/c.ts"]
        );
    }

    #[test]
    fn test_dedup_preserves_first_occurrence_order() {
        let (deduped, _) = dedup_findings(vec![
            finding("sha256:bb", vec![Location::new("src/b.ts", 1)]),
            finding("sha256:aa", vec![Location::new("src/a.ts", 1)]),
            finding("sha256:bb", vec![Location::new("src/b.ts", 9)]),
        ]);
        assert_eq!(deduped[0].fingerprint, "sha256:bb");
        assert_eq!(deduped[1].fingerprint, "sha256:aa");
        assert_eq!(deduped[0].locations.len(), 2);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let input = vec![
            finding("sha256:aa", vec![Location::new("src/a.ts", 1)]),
            finding("sha256:aa", vec![Location::new("src/a.ts", 40)]),
            finding("sha256:bb", vec![Location::new("src/b.ts", 2)]),
        ];
        let (once, collapsed) = dedup_findings(input);
        assert_eq!(collapsed, 1);
        let snapshot: Vec<_> = once
            .iter()
            .map(|f| (f.fingerprint.clone(), f.locations.clone()))
            .collect();
        let (twice, collapsed_again) = dedup_findings(once);
        assert_eq!(collapsed_again, 0);
        let roundtrip: Vec<_> = twice
            .iter()
            .map(|f| (f.fingerprint.clone(), f.locations.clone()))
            .collect();
        assert_eq!(snapshot, roundtrip);
    }

    #[test]
    fn test_fixture_path_detection() {
        assert!(is_test_fixture_path("test-fixtures/PmdIssues.java"));
        assert!(is_test_fixture_path("src/__fixtures__/sample.ts"));
        assert!(is_test_fixture_path("pkg/testdata/input.go"));
        assert!(is_test_fixture_path("tests/fixtures/deep/file.py"));
        assert!(!is_test_fixture_path("src/fixture_loader.ts"));
        assert!(!is_test_fixture_path("src/app.ts"));
    }
}
