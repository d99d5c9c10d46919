//! Review text normalization applied before classification.
//!
//! Mirrors the cleaning the sentiment model was trained with: lowercase,
//! URLs and @mentions removed, non-letters dropped, whitespace collapsed.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+|www\S+").unwrap());
static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\S+").unwrap());
static NON_LETTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z\s]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Clean a raw review body for the model. Total and pure: any input maps to
/// a string of lowercase ASCII letters and single spaces, possibly empty.
/// An empty result is still a valid classifier input, not an error.
pub fn clean_text(text: &str) -> String {
    let text = text.to_lowercase();
    let text = URL_RE.replace_all(&text, "");
    let text = MENTION_RE.replace_all(&text, "");
    let text = NON_LETTER_RE.replace_all(&text, "");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    text.trim().to_string()
}
