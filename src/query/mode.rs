use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A mode parameter that names no known mode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown search mode: {0}")]
pub struct UnknownSearchMode(pub String);

/// How a query is matched against the normalized titles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
    /// Whole-word occurrence anywhere in the title
    #[default]
    Contains,
    /// Title starts with the query
    StartsWith,
    /// Title ends with the query
    EndsWith,
    /// Title equals the query
    ExactMatch,
}

impl SearchMode {
    /// Every mode, in the order the search form lists them
    pub const ALL: [SearchMode; 4] = [
        SearchMode::Contains,
        SearchMode::StartsWith,
        SearchMode::EndsWith,
        SearchMode::ExactMatch,
    ];

    /// Label shown by the search form, also accepted as a mode parameter
    pub fn label(self) -> &'static str {
        match self {
            SearchMode::Contains => "Conté",
            SearchMode::StartsWith => "Comença per",
            SearchMode::EndsWith => "Acaba en",
            SearchMode::ExactMatch => "Coincident",
        }
    }

    /// Machine-friendly name
    pub fn name(self) -> &'static str {
        match self {
            SearchMode::Contains => "contains",
            SearchMode::StartsWith => "starts-with",
            SearchMode::EndsWith => "ends-with",
            SearchMode::ExactMatch => "exact-match",
        }
    }

    /// Resolve a raw mode parameter.
    ///
    /// Empty or unrecognized values fall back to [`SearchMode::Contains`].
    pub fn from_param(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    /// Whether exact title matches are ranked ahead of the collated order
    pub fn promotes_exact_matches(self) -> bool {
        matches!(self, SearchMode::Contains)
    }
}

impl FromStr for SearchMode {
    type Err = UnknownSearchMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        SearchMode::ALL
            .into_iter()
            .find(|mode| mode.label() == trimmed || mode.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownSearchMode(s.to_string()))
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_parse() {
        assert_eq!(SearchMode::from_param("Conté"), SearchMode::Contains);
        assert_eq!(SearchMode::from_param("Comença per"), SearchMode::StartsWith);
        assert_eq!(SearchMode::from_param("Acaba en"), SearchMode::EndsWith);
        assert_eq!(SearchMode::from_param("Coincident"), SearchMode::ExactMatch);
    }

    #[test]
    fn test_names_parse() {
        assert_eq!("starts-with".parse::<SearchMode>(), Ok(SearchMode::StartsWith));
        assert_eq!("EXACT-MATCH".parse::<SearchMode>(), Ok(SearchMode::ExactMatch));
    }

    #[test]
    fn test_unknown_defaults_to_contains() {
        assert_eq!(SearchMode::from_param(""), SearchMode::Contains);
        assert_eq!(SearchMode::from_param("whatever"), SearchMode::Contains);
        let err = "whatever".parse::<SearchMode>().unwrap_err();
        assert_eq!(err, UnknownSearchMode("whatever".to_string()));
        assert_eq!(err.to_string(), "unknown search mode: whatever");
    }

    #[test]
    fn test_only_contains_promotes_exact() {
        assert!(SearchMode::Contains.promotes_exact_matches());
        assert!(!SearchMode::StartsWith.promotes_exact_matches());
        assert!(!SearchMode::EndsWith.promotes_exact_matches());
        assert!(!SearchMode::ExactMatch.promotes_exact_matches());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&SearchMode::EndsWith).unwrap();
        assert_eq!(json, "\"ends-with\"");
        let mode: SearchMode = serde_json::from_str("\"contains\"").unwrap();
        assert_eq!(mode, SearchMode::Contains);
    }
}
