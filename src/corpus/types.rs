use crate::utils::{normalize_for_search, strip_bracketed_content};
use serde::{Deserialize, Serialize};

/// A dictionary entry as exported from the CMS.
///
/// Field names follow the export schema exactly, so existing corpus files
/// keep decoding. Missing fields decode as empty strings / `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    /// The phrase used for rendering
    pub title: String,
    /// Lowercase, no accents, parenthesis characters removed (content kept)
    pub title_normalized_wp: String,
    /// Lowercase, no accents, parenthetical content removed
    pub title_normalized_wpc: String,
    /// Concept grouping related phrases
    #[serde(rename = "concepte")]
    pub concept: String,
    /// The phrase relates to the antonym of the concept
    #[serde(rename = "antonim_concepte")]
    pub antonym: bool,
    /// Numbered sense of the concept (`1. ...`), usually empty
    #[serde(rename = "accepcio_concepte")]
    pub sense: String,
    /// The phrase is not present in any other source
    #[serde(rename = "nova_incorporacio")]
    pub new_incorporation: bool,
    /// Category code, e.g. `sv` for a verb phrase
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "definicio")]
    pub definition: String,
    #[serde(rename = "font_definicio")]
    pub definition_source: String,
    #[serde(rename = "exemples")]
    pub examples: String,
    #[serde(rename = "font_exemples")]
    pub examples_source: String,
    #[serde(rename = "sinonims")]
    pub synonyms: String,
    #[serde(rename = "altres_relacions")]
    pub related: String,
    #[serde(rename = "variants_dialectals")]
    pub dialectal_variants: String,
    #[serde(rename = "marcatge_dialectal")]
    pub dialectal_marking: String,
    #[serde(rename = "observacions")]
    pub observations: String,
}

impl Entry {
    /// Create an entry for a title and concept, deriving the normalized fields
    pub fn new(title: impl Into<String>, concept: impl Into<String>) -> Self {
        let mut entry = Self {
            title: title.into(),
            concept: concept.into(),
            ..Self::default()
        };
        entry.fill_normalized_fields();
        entry
    }

    /// Set the numbered sense label
    pub fn with_sense(mut self, sense: impl Into<String>) -> Self {
        self.sense = sense.into();
        self
    }

    /// Mark the entry as belonging to the antonym sense of its concept
    pub fn with_antonym(mut self, antonym: bool) -> Self {
        self.antonym = antonym;
        self
    }

    /// Normalized title keeping parenthetical content
    pub fn computed_wp(&self) -> String {
        normalize_for_search(&self.title)
    }

    /// Normalized title without parenthetical content
    pub fn computed_wpc(&self) -> String {
        normalize_for_search(&strip_bracketed_content(&self.title))
    }

    /// Key of this entry in the phrase existence set
    pub fn phrase_key(&self) -> String {
        strip_bracketed_content(&self.title)
    }

    /// Derive any normalized field the export left empty.
    ///
    /// Returns true if a field was filled in.
    pub fn fill_normalized_fields(&mut self) -> bool {
        let mut filled = false;
        if self.title_normalized_wp.is_empty() && !self.title.is_empty() {
            self.title_normalized_wp = self.computed_wp();
            filled = true;
        }
        if self.title_normalized_wpc.is_empty() && !self.title.is_empty() {
            self.title_normalized_wpc = self.computed_wpc();
            filled = true;
        }
        filled
    }

    /// Check the stored normalized fields against the recomputed ones
    pub fn has_consistent_normalization(&self) -> bool {
        self.title_normalized_wp == self.computed_wp()
            && self.title_normalized_wpc == self.computed_wpc()
    }

    /// Whether either normalized field equals the query exactly
    #[inline]
    pub fn is_exact_match(&self, normalized_query: &str) -> bool {
        self.title_normalized_wpc == normalized_query || self.title_normalized_wp == normalized_query
    }
}
