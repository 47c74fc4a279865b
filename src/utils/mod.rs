//! Utility functions and data structures.
//!
//! This module provides shared utilities used throughout dsff:
//!
//! ## Modules
//!
//! - [`app_data`] - Application configuration and data directory (XDG-compliant)
//! - [`collation`] - Catalan collation for alphabetic ordering
//! - [`normalize`] - Query and title normalization
//! - [`slug`] - Concept slugs, display titles and letter keys
//!
//! ## Key Functions
//!
//! ```no_run
//! use dsff::utils::{normalize_for_search, strip_bracketed_content};
//!
//! // Normalize a raw query the way the corpus fields were built
//! let query = normalize_for_search("Trencar   el GEL");
//! // Returns: "trencar el gel"
//!
//! // Phrase key used by the existence set
//! let key = strip_bracketed_content("fer (algú) el préssec");
//! // Returns: "fer el préssec"
//! ```

pub mod app_data;
pub mod collation;
pub mod normalize;
pub mod slug;

pub use app_data::*;
pub use collation::*;
pub use normalize::*;
pub use slug::*;
