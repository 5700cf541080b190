//! Effort estimation: how large a fix the finding implies.

use crate::models::{Effort, Tool};

/// Estimate fix size from autofix availability, spread, and tool heuristics.
pub fn estimate_effort(tool: Tool, rule_id: &str, location_count: usize, has_fix: bool) -> Effort {
    if has_fix {
        return Effort::S;
    }
    if location_count > 3 {
        return Effort::L;
    }
    if location_count > 1 {
        return Effort::M;
    }

    let rule = rule_id.to_lowercase();
    match tool {
        Tool::Jscpd => Effort::M,
        Tool::DependencyCruiser => {
            if rule.contains("cycle") {
                Effort::L
            } else {
                Effort::M
            }
        }
        Tool::Knip => Effort::S,
        Tool::Tsc | Tool::Mypy => Effort::M,
        Tool::Eslint | Tool::Prettier => Effort::S,
        Tool::Ruff => {
            if rule.starts_with('n') || rule.starts_with('d') {
                Effort::S
            } else {
                Effort::M
            }
        }
        Tool::Bandit => {
            if rule.contains("hardcoded") {
                Effort::S
            } else {
                Effort::M
            }
        }
        Tool::Pmd => {
            if rule.contains("unused") || rule.contains("empty") {
                Effort::S
            } else {
                Effort::M
            }
        }
        Tool::Spotbugs | Tool::Trunk | Tool::Semgrep => Effort::M,
    }
}
