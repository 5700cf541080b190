//! Autofix classification: whether a reported fix can be applied blindly.

use crate::models::{Autofix, Tool};

/// ESLint rules whose fixes are pure whitespace/style rewrites.
const ESLINT_SAFE_RULES: &[&str] = &[
    "semi",
    "quotes",
    "indent",
    "comma-dangle",
    "no-extra-semi",
    "no-trailing-spaces",
    "eol-last",
    "space-before-function-paren",
    "object-curly-spacing",
    "array-bracket-spacing",
    "prefer-const",
    "no-var",
];

/// Ruff rule prefixes whose fixes are mechanical (imports, whitespace,
/// quoting, upgrades).
const RUFF_SAFE_PREFIXES: &[&str] = &["I", "W", "E1", "E2", "E3", "E7", "Q", "COM", "UP"];

/// Classify the autofix level for a finding.
pub fn autofix_level(tool: Tool, rule_id: &str, has_fix: bool) -> Autofix {
    match tool {
        Tool::Prettier => Autofix::Safe,
        Tool::Eslint if has_fix => {
            if ESLINT_SAFE_RULES.contains(&rule_id) {
                Autofix::Safe
            } else {
                Autofix::RequiresReview
            }
        }
        Tool::Trunk if has_fix => Autofix::RequiresReview,
        Tool::Ruff if has_fix => {
            let rule = rule_id.to_uppercase();
            if RUFF_SAFE_PREFIXES.iter().any(|p| rule.starts_with(p)) {
                Autofix::Safe
            } else {
                Autofix::RequiresReview
            }
        }
        _ => Autofix::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prettier_always_safe() {
        assert_eq!(autofix_level(Tool::Prettier, "format", false), Autofix::Safe);
    }

    #[test]
    fn test_eslint_style_rules_safe() {
        assert_eq!(autofix_level(Tool::Eslint, "semi", true), Autofix::Safe);
        assert_eq!(autofix_level(Tool::Eslint, "prefer-const", true), Autofix::Safe);
        assert_eq!(
            autofix_level(Tool::Eslint, "no-unused-vars", true),
            Autofix::RequiresReview
        );
        assert_eq!(autofix_level(Tool::Eslint, "semi", false), Autofix::None);
    }

    #[test]
    fn test_trunk_fix_requires_review() {
        assert_eq!(
            autofix_level(Tool::Trunk, "yamllint:line-length", true),
            Autofix::RequiresReview
        );
        assert_eq!(autofix_level(Tool::Trunk, "yamllint:line-length", false), Autofix::None);
    }

    #[test]
    fn test_ruff_prefix_split() {
        assert_eq!(autofix_level(Tool::Ruff, "I001", true), Autofix::Safe);
        assert_eq!(autofix_level(Tool::Ruff, "E231", true), Autofix::Safe);
        assert_eq!(autofix_level(Tool::Ruff, "UP007", true), Autofix::Safe);
        assert_eq!(autofix_level(Tool::Ruff, "COM812", true), Autofix::Safe);
        assert_eq!(
            autofix_level(Tool::Ruff, "F401", true),
            Autofix::RequiresReview
        );
        assert_eq!(autofix_level(Tool::Ruff, "F401", false), Autofix::None);
    }

    #[test]
    fn test_no_fix_info_means_none() {
        assert_eq!(autofix_level(Tool::Bandit, "B608", false), Autofix::None);
        assert_eq!(autofix_level(Tool::Tsc, "TS2345", true), Autofix::None);
    }
}
