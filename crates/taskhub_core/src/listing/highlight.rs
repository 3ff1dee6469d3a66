//! Search-hit locations for rendering.
//!
//! The core does not produce markup; callers get byte ranges (or supply
//! their own markers) and escape the rest as their output format requires.

use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// Byte ranges of every case-insensitive occurrence of `term` in `text`.
///
/// Returns nothing for a blank term.
pub fn highlight_ranges(text: &str, term: &str) -> Vec<Range<usize>> {
    match term_matcher(term) {
        Some(matcher) => matcher.find_iter(text).map(|m| m.range()).collect(),
        None => Vec::new(),
    }
}

/// Wraps each occurrence of `term` in `open`/`close`, keeping the original
/// casing of the matched text.
pub fn mark_matches(text: &str, term: &str, open: &str, close: &str) -> String {
    let ranges = highlight_ranges(text, term);
    if ranges.is_empty() {
        return text.to_string();
    }

    let mut marked = String::with_capacity(text.len() + ranges.len() * (open.len() + close.len()));
    let mut cursor = 0;
    for range in ranges {
        marked.push_str(&text[cursor..range.start]);
        marked.push_str(open);
        marked.push_str(&text[range.clone()]);
        marked.push_str(close);
        cursor = range.end;
    }
    marked.push_str(&text[cursor..]);
    marked
}

fn term_matcher(term: &str) -> Option<Regex> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .ok()
}
