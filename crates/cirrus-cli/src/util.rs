//! Shared utility functions for CLI commands

/// Shorten `value` to at most `max_chars` characters, marking the cut with `...`
///
/// Counts characters rather than bytes, so multi-byte text never splits.
#[must_use]
pub fn truncate_value(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = value.chars().take(keep).collect();
    out.push_str("...");
    out
}
