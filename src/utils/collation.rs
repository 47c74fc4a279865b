//! Catalan collation for alphabetic ordering of phrases and concepts.

use icu::collator::{options::CollatorOptions, Collator, CollatorBorrowed};
use icu::locale::locale;
use icu_provider::DataError;
use std::cmp::Ordering;

/// Locale-aware string comparison using Catalan rules
pub struct Collation {
    collator: CollatorBorrowed<'static>,
}

impl Collation {
    /// Build a Catalan collator from the compiled CLDR data
    pub fn catalan() -> Result<Self, DataError> {
        let collator = Collator::try_new(locale!("ca").into(), CollatorOptions::default())?;
        Ok(Self { collator })
    }

    /// Compare two strings with Catalan collation
    #[inline]
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collator.compare(a, b)
    }

    /// Sort a list of strings in place (stable)
    pub fn sort_strings(&self, values: &mut [String]) {
        values.sort_by(|a, b| self.compare(a, b));
    }
}

impl std::fmt::Debug for Collation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collation").field("locale", &"ca").finish()
    }
}
