//! Orderings for search results and concept pages.

use crate::corpus::Entry;
use crate::query::mode::SearchMode;
use crate::utils::Collation;
use std::cmp::Ordering;

/// Ordering of search results.
///
/// Contains mode puts exact title matches first. Everything else is ordered
/// by the collated title without parenthetical content, then by the collated
/// title with it.
pub struct SearchRanking<'a> {
    collation: &'a Collation,
    normalized_query: &'a str,
    promote_exact: bool,
}

impl<'a> SearchRanking<'a> {
    pub fn new(collation: &'a Collation, normalized_query: &'a str, mode: SearchMode) -> Self {
        Self {
            collation,
            normalized_query,
            promote_exact: mode.promotes_exact_matches(),
        }
    }

    pub fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        if self.promote_exact {
            let a_exact = a.is_exact_match(self.normalized_query);
            let b_exact = b.is_exact_match(self.normalized_query);
            // true sorts first
            match b_exact.cmp(&a_exact) {
                Ordering::Equal => {}
                other => return other,
            }
        }

        compare_titles(self.collation, a, b)
    }
}

/// Collated comparison on the title without parenthetical content, falling
/// back to the title with it
pub fn compare_titles(collation: &Collation, a: &Entry, b: &Entry) -> Ordering {
    collation
        .compare(&a.title_normalized_wpc, &b.title_normalized_wpc)
        .then_with(|| collation.compare(&a.title_normalized_wp, &b.title_normalized_wp))
}

/// Ordering of the entries of one concept.
///
/// Antonym-sense entries go after every other entry. Within each group,
/// entries are ordered by numbered sense (no sense first), then by the
/// collated title without parenthetical content.
pub fn compare_concept_entries(collation: &Collation, a: &Entry, b: &Entry) -> Ordering {
    a.antonym
        .cmp(&b.antonym)
        .then_with(|| collation.compare(&a.sense, &b.sense))
        .then_with(|| collation.compare(&a.title_normalized_wpc, &b.title_normalized_wpc))
}
