//! Text helpers for request keys.

/// Upper-cases the first cased character of every word and lower-cases the rest.
/// A word starts after any character that has no case (space, underscore, digit).
pub(crate) fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_cased = false;
    for char in text.chars() {
        let cased = char.is_lowercase() || char.is_uppercase();
        if cased && previous_cased {
            result.extend(char.to_lowercase());
        } else if cased {
            result.extend(char.to_uppercase());
        } else {
            result.push(char);
        }
        previous_cased = cased;
    }
    result
}

/// Canonical form of a request key: title-cased, trimmed, spaces as underscores.
pub(crate) fn normalize_key(key: &str) -> String {
    title_case(key).trim().replace(' ', "_")
}
