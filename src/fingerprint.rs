//! Stable finding fingerprints.
//!
//! A fingerprint is a SHA-256 digest over the finding's semantic identity:
//! `(tool, ruleId, canonical path, line bucket, normalized message)`.
//! Line numbers are bucketed so small insertions above a finding do not
//! change its identity, and messages are normalized so reformatting,
//! renamed literals, and changed numerals do not either.

use crate::models::Tool;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Findings within the same 20-line bucket share a line identity.
pub const LINE_BUCKET_SIZE: u32 = 20;

/// Hex digits of the digest shown in user-facing output.
pub const SHORT_FINGERPRINT_LEN: usize = 12;

const FINGERPRINT_PREFIX: &str = "sha256:";

fn quoted_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""[^"]*"|'[^']*'|`[^`]*`"#).expect("valid regex"))
}

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Normalize a message for fingerprinting: lowercase, strip quoted
/// literals and numerals, collapse whitespace.
pub fn normalize_message(message: &str) -> String {
    let lowered = message.to_lowercase();
    let no_literals = quoted_literal_re().replace_all(&lowered, "");
    let no_digits = digits_re().replace_all(&no_literals, "");
    whitespace_re()
        .replace_all(&no_digits, " ")
        .trim()
        .to_string()
}

/// Bucket a 1-based start line; absorbs drift of up to ±20 lines.
pub fn line_bucket(start_line: u32) -> u32 {
    start_line / LINE_BUCKET_SIZE
}

/// Compute the full `sha256:<hex>` fingerprint for a finding.
pub fn fingerprint(
    tool: Tool,
    rule_id: &str,
    canonical_path: &str,
    start_line: u32,
    message: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tool.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(rule_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical_path.as_bytes());
    hasher.update(b"\n");
    hasher.update(line_bucket(start_line).to_string().as_bytes());
    hasher.update(b"\n");
    hasher.update(normalize_message(message).as_bytes());
    format!("{}{:x}", FINGERPRINT_PREFIX, hasher.finalize())
}

/// Short display form: the first 12 hex characters of the digest.
pub fn short_fingerprint(fingerprint: &str) -> &str {
    let hex = fingerprint
        .strip_prefix(FINGERPRINT_PREFIX)
        .unwrap_or(fingerprint);
    &hex[..hex.len().min(SHORT_FINGERPRINT_LEN)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_message_strips_literals_and_numbers() {
        assert_eq!(
            normalize_message("Variable 'userCount' assigned 42 times"),
            "variable assigned times"
        );
        assert_eq!(
            normalize_message("  Unexpected   \"foo\"  token "),
            "unexpected token"
        );
        assert_eq!(normalize_message("Use `let` instead"), "use instead");
    }

    #[test]
    fn test_normalize_message_is_idempotent() {
        let once = normalize_message("Found 3 'bad' things");
        assert_eq!(normalize_message(&once), once);
    }

    #[test]
    fn test_line_bucket_boundaries() {
        assert_eq!(line_bucket(0), 0);
        assert_eq!(line_bucket(19), 0);
        assert_eq!(line_bucket(20), 1);
        assert_eq!(line_bucket(42), 2);
        assert_eq!(line_bucket(48), 2);
        assert_eq!(line_bucket(61), 3);
    }

    #[test]
    fn test_fingerprint_stable_within_bucket() {
        let a = fingerprint(Tool::Eslint, "no-unused-vars", "src/a.ts", 42, "'x' unused");
        let b = fingerprint(Tool::Eslint, "no-unused-vars", "src/a.ts", 48, "'y' unused");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_changes_across_bucket() {
        let a = fingerprint(Tool::Eslint, "no-unused-vars", "src/a.ts", 42, "'x' unused");
        let b = fingerprint(Tool::Eslint, "no-unused-vars", "src/a.ts", 61, "'x' unused");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_sensitive_to_identity_fields() {
        let base = fingerprint(Tool::Eslint, "no-unused-vars", "src/a.ts", 42, "msg");
        assert_ne!(
            base,
            fingerprint(Tool::Ruff, "no-unused-vars", "src/a.ts", 42, "msg")
        );
        assert_ne!(
            base,
            fingerprint(Tool::Eslint, "no-undef", "src/a.ts", 42, "msg")
        );
        assert_ne!(
            base,
            fingerprint(Tool::Eslint, "no-unused-vars", "src/b.ts", 42, "msg")
        );
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = fingerprint(Tool::Tsc, "TS2345", "src/a.ts", 1, "type error");
        assert!(fp.starts_with("sha256:"));
        assert_eq!(fp.len(), "sha256:".len() + 64);
        assert_eq!(short_fingerprint(&fp).len(), 12);
        assert!(fp[7..].starts_with(short_fingerprint(&fp)));
    }
}
