//! Best-effort documentation links for rule ids.
//!
//! Trunk is a composite runner, so its rule ids arrive in many shapes
//! (advisories, checkov policies, markdownlint/shellcheck codes, yamllint
//! rule names, ESLint rules); a cascade keyed on the id's shape picks the
//! right doc site. Direct tools use their published URL templates. When
//! nothing matches, the rule renders as plain code.

use crate::models::Tool;
use regex::Regex;
use std::sync::OnceLock;

/// yamllint's built-in rule names.
const YAMLLINT_RULES: &[&str] = &[
    "braces",
    "brackets",
    "colons",
    "commas",
    "comments",
    "comments-indentation",
    "document-end",
    "document-start",
    "empty-lines",
    "empty-values",
    "hyphens",
    "indentation",
    "key-duplicates",
    "key-ordering",
    "line-length",
    "new-line-at-end-of-file",
    "new-lines",
    "octal-values",
    "quoted-strings",
    "trailing-spaces",
    "truthy",
];

fn markdownlint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^MD\d{3}$").expect("valid regex"))
}

fn shellcheck_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^SC\d{4}$").expect("valid regex"))
}

fn eslint_rule_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("valid regex"))
}

/// Render a rule id as Markdown: a link when a doc URL is known, plain
/// code otherwise. Plus-joined clusters render each member individually.
pub fn render_rule(tool: Tool, rule_id: &str) -> String {
    if rule_id.contains('+') {
        return rule_id
            .split('+')
            .map(|rule| render_rule(tool, rule))
            .collect::<Vec<_>>()
            .join(" + ");
    }
    match rule_url(tool, rule_id) {
        Some(url) => format!("[{rule_id}]({url})"),
        None => format!("`{rule_id}`"),
    }
}

/// Best-effort documentation URL for a single (tool, rule) pair.
pub fn rule_url(tool: Tool, rule_id: &str) -> Option<String> {
    match tool {
        Tool::Trunk => trunk_rule_url(rule_id),
        Tool::Eslint => eslint_rule_url(rule_id),
        Tool::Semgrep => Some(format!("https://semgrep.dev/r/{rule_id}")),
        Tool::Ruff => Some(format!(
            "https://docs.astral.sh/ruff/rules/#{}",
            rule_id.to_lowercase()
        )),
        Tool::Mypy => Some(format!(
            "https://mypy.readthedocs.io/en/stable/error_code_list.html#code-{}",
            rule_id.to_lowercase()
        )),
        Tool::Bandit => Some(format!(
            "https://bandit.readthedocs.io/en/latest/search.html?q={rule_id}"
        )),
        Tool::Pmd => Some(format!(
            "https://docs.pmd-code.org/latest/pmd_rules_java.html#{}",
            rule_id.to_lowercase()
        )),
        Tool::Spotbugs => Some(format!(
            "https://spotbugs.readthedocs.io/en/stable/bugDescriptions.html#{}",
            rule_id.to_lowercase().replace('_', "-")
        )),
        Tool::Prettier | Tool::Tsc | Tool::Jscpd | Tool::DependencyCruiser | Tool::Knip => None,
    }
}

/// Shape cascade for trunk's composite rule ids.
fn trunk_rule_url(rule_id: &str) -> Option<String> {
    if rule_id.starts_with("GHSA-") {
        return Some(format!("https://github.com/advisories/{rule_id}"));
    }
    if rule_id.starts_with("CVE-") {
        return Some(format!("https://nvd.nist.gov/vuln/detail/{rule_id}"));
    }
    if let Some(number) = rule_id.strip_prefix("CWE-") {
        return Some(format!(
            "https://cwe.mitre.org/data/definitions/{number}.html"
        ));
    }
    if rule_id.starts_with("CKV_") || rule_id.starts_with("CKV2_") {
        return Some("https://www.checkov.io/5.Policy%20Index/all.html".to_string());
    }
    if markdownlint_re().is_match(rule_id) {
        return Some(format!(
            "https://github.com/DavidAnson/markdownlint/blob/main/doc/{}.md",
            rule_id.to_lowercase()
        ));
    }
    if shellcheck_re().is_match(rule_id) {
        return Some(format!("https://www.shellcheck.net/wiki/{rule_id}"));
    }
    if YAMLLINT_RULES.contains(&rule_id) {
        return Some(format!(
            "https://yamllint.readthedocs.io/en/stable/rules.html#module-yamllint.rules.{}",
            rule_id.replace('-', "_")
        ));
    }
    if let Some(name) = rule_id.strip_prefix("@typescript-eslint/") {
        return Some(format!("https://typescript-eslint.io/rules/{name}"));
    }
    if eslint_rule_re().is_match(rule_id) {
        return Some(format!("https://eslint.org/docs/latest/rules/{rule_id}"));
    }
    None
}

fn eslint_rule_url(rule_id: &str) -> Option<String> {
    if let Some(name) = rule_id.strip_prefix("@typescript-eslint/") {
        return Some(format!("https://typescript-eslint.io/rules/{name}"));
    }
    if eslint_rule_re().is_match(rule_id) {
        return Some(format!("https://eslint.org/docs/latest/rules/{rule_id}"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trunk_cascade() {
        assert_eq!(
            rule_url(Tool::Trunk, "GHSA-93q8-gq69-wqmw").unwrap(),
            "https://github.com/advisories/GHSA-93q8-gq69-wqmw"
        );
        assert_eq!(
            rule_url(Tool::Trunk, "CVE-2024-12345").unwrap(),
            "https://nvd.nist.gov/vuln/detail/CVE-2024-12345"
        );
        assert_eq!(
            rule_url(Tool::Trunk, "CWE-79").unwrap(),
            "https://cwe.mitre.org/data/definitions/79.html"
        );
        assert!(rule_url(Tool::Trunk, "CKV_AWS_20").is_some());
        assert_eq!(
            rule_url(Tool::Trunk, "MD013").unwrap(),
            "https://github.com/DavidAnson/markdownlint/blob/main/doc/md013.md"
        );
        assert_eq!(
            rule_url(Tool::Trunk, "SC2086").unwrap(),
            "https://www.shellcheck.net/wiki/SC2086"
        );
        assert_eq!(
            rule_url(Tool::Trunk, "line-length").unwrap(),
            "https://yamllint.readthedocs.io/en/stable/rules.html#module-yamllint.rules.line_length"
        );
        assert_eq!(
            rule_url(Tool::Trunk, "no-unused-vars").unwrap(),
            "https://eslint.org/docs/latest/rules/no-unused-vars"
        );
        assert_eq!(
            rule_url(Tool::Trunk, "@typescript-eslint/no-explicit-any").unwrap(),
            "https://typescript-eslint.io/rules/no-explicit-any"
        );
        assert!(rule_url(Tool::Trunk, "SOME_OPAQUE_ID").is_none());
    }

    #[test]
    fn test_direct_tools() {
        assert_eq!(
            rule_url(Tool::Eslint, "no-eval").unwrap(),
            "https://eslint.org/docs/latest/rules/no-eval"
        );
        assert!(rule_url(Tool::Eslint, "Weird.Rule").is_none());
        assert!(rule_url(Tool::Semgrep, "javascript.lang.security.audit.xss")
            .unwrap()
            .starts_with("https://semgrep.dev/r/"));
        assert!(rule_url(Tool::Mypy, "arg-type")
            .unwrap()
            .ends_with("#code-arg-type"));
        assert!(rule_url(Tool::Tsc, "TS2345").is_none());
        assert!(rule_url(Tool::Knip, "exports").is_none());
    }

    #[test]
    fn test_render_rule_plain_and_linked() {
        assert_eq!(render_rule(Tool::Tsc, "TS2345"), "`TS2345`");
        assert!(render_rule(Tool::Eslint, "semi").starts_with("[semi]("));
    }

    #[test]
    fn test_render_rule_merged_cluster() {
        let rendered = render_rule(Tool::Eslint, "semi+quotes+does.not.match");
        let parts: Vec<&str> = rendered.split(" + ").collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].starts_with("[semi]("));
        assert!(parts[1].starts_with("[quotes]("));
        assert_eq!(parts[2], "`does.not.match`");
    }
}
