//! Issue title rendering.

use crate::models::Finding;

/// Hard ceiling on generated title length, in characters.
pub const MAX_TITLE_LEN: usize = 100;

/// Render `"[<label>] <title><locationHint>"`, truncated to 100 columns.
pub fn render_title(finding: &Finding, label: &str) -> String {
    let hint = location_hint(finding);
    truncate_title(format!("[{}] {}{}", label, finding.title, hint))
}

/// Compact file hint appended to the title. Four or more distinct files
/// is too noisy to summarize, so the hint is dropped entirely.
fn location_hint(finding: &Finding) -> String {
    let mut files: Vec<&str> = Vec::new();
    for location in &finding.locations {
        let name = location.file_name();
        if !files.contains(&name) {
            files.push(name);
        }
    }
    match files.len() {
        1 => format!(" in {}", files[0]),
        2 | 3 => format!(" in {} +{} more", files[0], files.len() - 1),
        _ => String::new(),
    }
}

/// Cut an over-long title at the last whitespace before column 97 when
/// one exists, hard at column 97 otherwise, and append an ellipsis.
fn truncate_title(title: String) -> String {
    let chars: Vec<char> = title.chars().collect();
    if chars.len() <= MAX_TITLE_LEN {
        return title;
    }
    let limit = MAX_TITLE_LEN - 3;
    let cut = chars[..limit]
        .iter()
        .rposition(|c| c.is_whitespace())
        .unwrap_or(limit);
    let mut truncated: String = chars[..cut].iter().collect();
    truncated.push_str("...");
    truncated
}
