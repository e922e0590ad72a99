//! Shared utility functions.

/// Truncate a string to at most `max_chars` characters, appending `...`
/// when anything was cut off.
///
/// Counts `char`s rather than bytes so multibyte text is never split.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}...", &s[..cut]),
    }
}

/// Collapse all runs of whitespace (including newlines) into single spaces.
///
/// Used before writing model text into single-line memory entries and logs.
pub fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
