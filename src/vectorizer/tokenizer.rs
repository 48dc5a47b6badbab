//! Text to term splitting shared by fit and transform.

use regex::Regex;
use std::sync::LazyLock;

use super::stopwords::is_stopword;

/// Runs of two or more Unicode word characters.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex"));

/// Lowercases `text` and returns its non-stopword terms in order of appearance.
///
/// Single-character tokens never match the pattern, so "a" or "I" are dropped
/// even before the stopword check.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|term| !is_stopword(term))
        .map(str::to_string)
        .collect()
}
