//! Per-mode matching of a normalized query against an entry's titles.

use crate::corpus::Entry;
use crate::query::mode::SearchMode;
use regex::Regex;

/// A query compiled for one search mode
pub enum Matcher<'q> {
    Contains(Option<Regex>),
    StartsWith(&'q str),
    EndsWith(&'q str),
    ExactMatch(&'q str),
}

impl<'q> Matcher<'q> {
    /// Compile `normalized_query` for `mode`
    pub fn new(normalized_query: &'q str, mode: SearchMode) -> Self {
        match mode {
            SearchMode::Contains => Matcher::Contains(word_pattern(normalized_query)),
            SearchMode::StartsWith => Matcher::StartsWith(normalized_query),
            SearchMode::EndsWith => Matcher::EndsWith(normalized_query),
            SearchMode::ExactMatch => Matcher::ExactMatch(normalized_query),
        }
    }

    /// Check an entry against the query
    pub fn matches(&self, entry: &Entry) -> bool {
        let wpc = entry.title_normalized_wpc.as_str();
        let wp = entry.title_normalized_wp.as_str();

        match self {
            Matcher::Contains(Some(regex)) => {
                // The second field only adds something when the parentheses had content
                regex.is_match(wpc) || (wpc != wp && regex.is_match(wp))
            }
            Matcher::Contains(None) => false,
            Matcher::StartsWith(query) => wpc.starts_with(query) || wp.starts_with(query),
            Matcher::EndsWith(query) => wpc.ends_with(query) || wp.ends_with(query),
            Matcher::ExactMatch(query) => wpc == *query || wp == *query,
        }
    }
}

/// Build the whole-word pattern for Contains mode.
///
/// A match must be bounded on both sides by the field edge or by a character
/// that is neither a letter nor a combining mark. Returns `None` if the
/// pattern cannot be compiled (e.g. a query exceeding the regex size limit).
pub fn word_pattern(normalized_query: &str) -> Option<Regex> {
    let pattern = format!(
        r"(?:^|[^\p{{L}}\p{{M}}]){}(?:[^\p{{L}}\p{{M}}]|$)",
        regex::escape(normalized_query)
    );

    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(error = %e, "could not compile word pattern for query");
            None
        }
    }
}
