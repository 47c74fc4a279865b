use crate::corpus::{Corpus, Entry};
use crate::query::matcher::Matcher;
use crate::query::mode::SearchMode;
use crate::query::paging::{page_bounds, SearchPage};
use crate::query::ranking::{compare_concept_entries, SearchRanking};
use crate::utils::concept_from_slug;
use rayon::prelude::*;

/// Search and concept lookups over one corpus snapshot.
///
/// Every operation is a linear scan of the snapshot and cannot fail: no
/// matches, and pages past the end, come back as empty results.
pub struct SearchExecutor<'a> {
    corpus: &'a Corpus,
}

impl<'a> SearchExecutor<'a> {
    pub fn new(corpus: &'a Corpus) -> Self {
        Self { corpus }
    }

    /// Search for an already-normalized query and return one page of results
    pub fn search(
        &self,
        normalized_query: &str,
        mode: SearchMode,
        page: usize,
        page_size: usize,
    ) -> SearchPage {
        let ranked = self.rank(normalized_query, mode);
        self.page(&ranked, page, page_size)
    }

    /// Positions of all matching entries, in ranked order
    pub fn rank(&self, normalized_query: &str, mode: SearchMode) -> Vec<usize> {
        if normalized_query.is_empty() {
            return Vec::new();
        }

        let entries = self.corpus.entries();
        let matcher = Matcher::new(normalized_query, mode);

        // Collect keeps load order, which the stable sort below preserves for ties
        let mut matched: Vec<usize> = entries
            .par_iter()
            .enumerate()
            .filter(|(_, entry)| matcher.matches(entry))
            .map(|(index, _)| index)
            .collect();

        let ranking = SearchRanking::new(self.corpus.collation(), normalized_query, mode);
        matched.sort_by(|&a, &b| ranking.compare(&entries[a], &entries[b]));

        matched
    }

    /// Materialize one page of a ranked result list
    pub fn page(&self, ranked: &[usize], page: usize, page_size: usize) -> SearchPage {
        let total = ranked.len();
        let entries = match page_bounds(total, page, page_size) {
            Some((start, end)) => ranked[start..end]
                .iter()
                .map(|&index| self.corpus.entries()[index].clone())
                .collect(),
            None => Vec::new(),
        };

        SearchPage { entries, total }
    }

    /// All entries of a concept, compared case-insensitively, in concept order
    pub fn entries_for_concept(&self, concept_key: &str) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self
            .corpus
            .entries()
            .iter()
            .filter(|entry| eq_ignore_case(&entry.concept, concept_key))
            .cloned()
            .collect();

        let collation = self.corpus.collation();
        entries.sort_by(|a, b| compare_concept_entries(collation, a, b));
        entries
    }

    /// All entries of the concept a URL slug refers to
    pub fn entries_for_slug(&self, slug: &str) -> Vec<Entry> {
        self.entries_for_concept(&concept_from_slug(slug))
    }
}

/// Unicode case-insensitive equality without allocating
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
