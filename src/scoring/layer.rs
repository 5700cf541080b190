//! Layer classification: which concern area a finding belongs to.

use crate::models::{Layer, Tool};

/// Rule-id tokens that mark a finding as security-relevant.
const SECURITY_TOKENS: &[&str] = &[
    "security",
    "xss",
    "injection",
    "csrf",
    "sql",
    "xxe",
    "ssrf",
    "auth",
    "crypto",
    "secret",
    "password",
    "eval",
    "dangerous",
    "hardcoded",
    "random",
    "prototype",
    "pollution",
    "vulnerable",
];

/// Classify a finding's concern area from its tool and rule id.
pub fn classify_layer(tool: Tool, rule_id: &str) -> Layer {
    let rule = rule_id.to_lowercase();

    if tool == Tool::Bandit {
        return Layer::Security;
    }
    if tool == Tool::Spotbugs {
        return if has_security_token(&rule) || rule.contains("sql") || rule.contains("xss") {
            Layer::Security
        } else {
            Layer::Code
        };
    }
    if rule_id.starts_with("GHSA-") || rule_id.starts_with("CVE-") || rule_id.starts_with("CWE-") {
        return Layer::Security;
    }
    if tool == Tool::Trunk && (rule_id.contains("GHSA") || rule_id.contains("CVE")) {
        return Layer::Security;
    }
    if has_security_token(&rule) {
        return Layer::Security;
    }
    if tool == Tool::Ruff && is_ruff_security_rule(&rule) {
        return Layer::Security;
    }
    if tool == Tool::DependencyCruiser
        || tool == Tool::Knip
        || rule.contains("import")
        || rule.contains("dependency")
        || rule.contains("cycle")
    {
        return Layer::Architecture;
    }
    Layer::Code
}

/// Token match: split the rule id on non-alphanumeric boundaries and
/// check membership against the security token set.
fn has_security_token(rule: &str) -> bool {
    rule.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| SECURITY_TOKENS.contains(&token))
}

/// Ruff's `S` prefix (flake8-bandit) is its security ruleset.
fn is_ruff_security_rule(rule: &str) -> bool {
    let mut chars = rule.chars();
    chars.next() == Some('s') && chars.next().is_some_and(|c| c.is_ascii_digit())
}
