/// Truncate a string to a maximum length, adding ellipsis if needed.
/// Lengths are in characters.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// A bar of `max` cells with the first `score` filled, e.g. "████░"
pub fn score_bar(score: u8, max: u8) -> String {
    let filled = score.min(max) as usize;
    let empty = (max as usize).saturating_sub(filled);
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}
