//! Text cleanup for spreadsheet cells.

use regex::Regex;
use std::sync::OnceLock;

/// Hard limit a single spreadsheet cell can hold
const MAX_CELL_CHARS: usize = 32_767;

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

/// Clean free-form text for a spreadsheet cell: strip HTML tags, collapse
/// newlines and whitespace runs to single spaces, and truncate to the cell
/// limit.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let without_tags = tag_pattern().replace_all(text, "");
    let collapsed = without_tags
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.chars().count() > MAX_CELL_CHARS {
        collapsed.chars().take(MAX_CELL_CHARS).collect()
    } else {
        collapsed
    }
}
