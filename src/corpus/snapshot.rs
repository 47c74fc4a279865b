//! The immutable corpus snapshot and the cell used to swap it on reload.

use crate::corpus::loader::LoadError;
use crate::corpus::types::Entry;
use crate::utils::{letter_key, Collation};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// All entries plus the indexes derived from them at load time.
///
/// Nothing in a `Corpus` changes after construction, so it can be shared
/// between request threads behind an `Arc` without locking.
#[derive(Debug)]
pub struct Corpus {
    entries: Vec<Entry>,
    /// Phrase keys (bracketed content removed) of every entry
    phrases: FxHashSet<String>,
    /// Letter -> distinct concepts, each list collated
    concepts_by_letter: BTreeMap<String, Vec<String>>,
    /// Entries whose stored normalized fields disagree with the recomputed ones
    inconsistent: Vec<usize>,
    collation: Collation,
}

impl Corpus {
    /// Build the snapshot and its indexes from decoded entries
    pub fn from_entries(mut entries: Vec<Entry>) -> Result<Self, LoadError> {
        if entries.is_empty() {
            return Err(LoadError::Empty);
        }

        let collation = Collation::catalan()?;

        let mut phrases = FxHashSet::with_capacity_and_hasher(entries.len(), Default::default());
        let mut concepts_by_letter: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut seen_concepts: FxHashSet<String> = FxHashSet::default();
        let mut inconsistent = Vec::new();
        let mut filled = 0usize;

        for (index, entry) in entries.iter_mut().enumerate() {
            if entry.fill_normalized_fields() {
                filled += 1;
            } else if !entry.has_consistent_normalization() {
                inconsistent.push(index);
            }

            phrases.insert(entry.phrase_key());

            let letter = letter_key(&entry.concept).ok_or_else(|| LoadError::MissingConcept {
                index,
                title: entry.title.clone(),
            })?;

            // Keep first-seen order until the final collated sort
            if seen_concepts.insert(entry.concept.clone()) {
                concepts_by_letter
                    .entry(letter)
                    .or_default()
                    .push(entry.concept.clone());
            }
        }

        for concepts in concepts_by_letter.values_mut() {
            collation.sort_strings(concepts);
        }

        if filled > 0 {
            tracing::debug!(filled, "derived missing normalized titles");
        }
        if !inconsistent.is_empty() {
            tracing::warn!(
                count = inconsistent.len(),
                "stored normalized titles differ from recomputed ones"
            );
        }

        Ok(Self {
            entries,
            phrases,
            concepts_by_letter,
            inconsistent,
            collation,
        })
    }

    /// All entries in load order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether a phrase exists as an entry of its own.
    ///
    /// Bracketed content of the given phrase is ignored, so a synonym written
    /// as `fer (algú) el préssec` finds the entry `fer el préssec`.
    pub fn phrase_exists(&self, phrase: &str) -> bool {
        self.phrases
            .contains(&crate::utils::strip_bracketed_content(phrase))
    }

    /// Read-only view of the phrase existence set
    pub fn phrases(&self) -> &FxHashSet<String> {
        &self.phrases
    }

    /// Collated concepts starting with `letter`, if any
    pub fn concepts_for_letter(&self, letter: &str) -> Option<&[String]> {
        self.concepts_by_letter
            .get(letter)
            .map(Vec::as_slice)
            .filter(|concepts| !concepts.is_empty())
    }

    /// Letters that have at least one concept, in key order
    pub fn letters(&self) -> impl Iterator<Item = &str> {
        self.concepts_by_letter.keys().map(String::as_str)
    }

    /// Read-only view of the letter index
    pub fn concepts_by_letter(&self) -> &BTreeMap<String, Vec<String>> {
        &self.concepts_by_letter
    }

    pub fn letter_count(&self) -> usize {
        self.concepts_by_letter.len()
    }

    /// Positions of entries with stored normalized fields that do not match
    /// the normalizer
    pub fn inconsistent_entries(&self) -> &[usize] {
        &self.inconsistent
    }

    /// Collator shared by every ordering over this corpus
    pub fn collation(&self) -> &Collation {
        &self.collation
    }
}

/// Holder for a snapshot that can be replaced while readers keep using the
/// version they already fetched.
///
/// The lock only guards the pointer; readers clone the `Arc` and release it
/// immediately.
#[derive(Debug)]
pub struct SnapshotCell<T> {
    current: RwLock<Arc<T>>,
}

impl<T> SnapshotCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(value)),
        }
    }

    /// Get the current snapshot
    pub fn load(&self) -> Arc<T> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Install a new snapshot, returning the previous one
    pub fn swap(&self, value: T) -> Arc<T> {
        let next = Arc::new(value);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<Entry> {
        vec![
            Entry::new("trencar el gel", "GEL"),
            Entry::new("fer (algú) el préssec", "ENGANYAR"),
            Entry::new("ésser de gel", "GEL"),
            Entry::new("enredar la troca", "enganyar"),
            Entry::new("anar de bòlit", "ÀNSIA"),
            Entry::new("a corre-cuita", "ACCELERAR"),
        ]
    }

    #[test]
    fn test_letter_index_dedups_and_collates() {
        let corpus = Corpus::from_entries(sample_entries()).unwrap();

        let letters: Vec<&str> = corpus.letters().collect();
        assert_eq!(letters, vec!["A", "E", "G"]);

        assert_eq!(
            corpus.concepts_for_letter("A").unwrap(),
            &["ACCELERAR".to_string(), "ÀNSIA".to_string()]
        );
        // Distinct spellings are distinct concepts
        assert_eq!(corpus.concepts_for_letter("E").unwrap().len(), 2);
        assert_eq!(corpus.concepts_for_letter("G").unwrap(), &["GEL".to_string()]);
        assert!(corpus.concepts_for_letter("Z").is_none());
    }

    #[test]
    fn test_phrase_existence_ignores_brackets() {
        let corpus = Corpus::from_entries(sample_entries()).unwrap();
        assert!(corpus.phrase_exists("trencar el gel"));
        assert!(corpus.phrase_exists("fer el préssec"));
        assert!(corpus.phrase_exists("fer el préssec (v.f.)"));
        assert!(!corpus.phrase_exists("trencar el glaç"));
    }

    #[test]
    fn test_inconsistent_entries_are_reported() {
        let mut entries = sample_entries();
        entries[0].title_normalized_wpc = "stale".to_string();
        let corpus = Corpus::from_entries(entries).unwrap();
        assert_eq!(corpus.inconsistent_entries(), &[0]);
    }

    #[test]
    fn test_stored_fields_match_recomputed() {
        let corpus = Corpus::from_entries(sample_entries()).unwrap();
        assert!(corpus.inconsistent_entries().is_empty());
        for entry in corpus.entries() {
            assert_eq!(entry.title_normalized_wp, entry.computed_wp());
            assert_eq!(entry.title_normalized_wpc, entry.computed_wpc());
        }
    }

    #[test]
    fn test_snapshot_cell_swap_keeps_old_readers() {
        let cell = SnapshotCell::new(1u32);
        let before = cell.load();
        let previous = cell.swap(2);
        assert_eq!(*before, 1);
        assert_eq!(*previous, 1);
        assert_eq!(*cell.load(), 2);
    }
}
