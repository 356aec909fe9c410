//! Keyword label normalization.
//!
//! # Invariants
//! - Normalized labels are trimmed, single-spaced and lowercase.
//! - A normalized label set never contains duplicates.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Storage-assigned keyword identifier.
pub type KeywordId = i64;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Normalizes one keyword label. Returns `None` for blank input.
pub fn normalize_keyword(raw: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(raw.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.to_lowercase())
    }
}

/// Normalizes and deduplicates labels, dropping blank ones.
pub fn normalized_keyword_set(raw: &[String]) -> BTreeSet<String> {
    raw.iter()
        .filter_map(|label| normalize_keyword(label))
        .collect()
}
