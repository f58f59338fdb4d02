//! Whitespace normalization and splitting.

/// Strip leading and trailing whitespace.
pub fn trim(text: &str) -> &str {
    text.trim()
}

/// Collapse every run of whitespace into a single space.
pub fn one_space(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Trim, then collapse internal whitespace.
pub fn one_space_and_trim(text: &str) -> String {
    one_space(trim(text))
}

/// Normalize `text` and split it on `delimiter` into non-empty, trimmed
/// tokens. An empty or all-whitespace input yields no tokens.
pub fn split(text: &str, delimiter: char) -> Vec<String> {
    let normalized = one_space_and_trim(text);
    if normalized.is_empty() {
        return Vec::new();
    }
    normalized
        .split(delimiter)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
