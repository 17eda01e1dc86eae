//! Display-name cleanup.

/// Normalizes a player-supplied display name.
///
/// Control characters are dropped, whitespace runs collapse to one space,
/// the ends are trimmed and the result is cut to `max_len` characters.
/// Returns `None` if nothing printable is left.
pub fn sanitize_name(raw: &str, max_len: usize) -> Option<String> {
    let cleaned = raw
        .split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let truncated: String = cleaned.chars().take(max_len).collect();
    let truncated = truncated.trim_end();
    (!truncated.is_empty()).then(|| truncated.to_string())
}

/// Case-insensitive name comparison used for duplicate checks.
pub fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
