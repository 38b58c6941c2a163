//! Common-name tokenizer
//!
//! Folds a common name or query to comparable tokens: parenthesized
//! asides dropped, accents folded to base letters, everything
//! lowercased, split on whitespace, hyphens and other punctuation.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static ASIDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\([^)]*\)|\[[^\]]*\]").expect("aside regex")
});

/// Accent-fold and lowercase without splitting
pub fn normalize(text: &str) -> String {
    let stripped = ASIDE_RE.replace_all(text, " ");
    let folded: String = stripped
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized tokens of a common name or query
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
