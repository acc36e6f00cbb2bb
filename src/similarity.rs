use std::collections::HashSet;

const MIN_TOKEN_CHARS: usize = 3;

pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Jaccard index of the lower-cased whitespace tokens longer than two
/// characters. Returns 0.0 when either side has no such tokens.
pub fn similarity(left: &str, right: &str) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let left_tokens = token_set(left);
    let right_tokens = token_set(right);
    if left_tokens.is_empty() || right_tokens.is_empty() {
        return 0.0;
    }

    let intersection = left_tokens.intersection(&right_tokens).count();
    let union = left_tokens.union(&right_tokens).count();

    intersection as f64 / union as f64
}

fn token_set(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .collect()
}

/// Returns at most `max_chars` characters of `text`, cut on a character
/// boundary.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
