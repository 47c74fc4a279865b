//! # dsff - Catalan idiom dictionary search
//!
//! dsff searches a read-only corpus of Catalan phrases (idioms and fixed
//! expressions), each grouped under a concept. The corpus is loaded once,
//! indexed in memory, and shared by every lookup.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`corpus`] - Entry model, gzip/JSON loading, the immutable snapshot
//! - [`query`] - Match modes, matching, ranking, pagination, concept grouping
//! - [`server`] - Persistent daemon keeping the corpus warm (Unix only)
//! - [`output`] - Terminal rendering of results
//! - [`utils`] - Normalization, collation, slugs, configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use dsff::corpus::load_from_path;
//! use dsff::query::{SearchExecutor, SearchMode};
//! use dsff::utils::normalize_for_search;
//! use std::path::Path;
//!
//! let corpus = load_from_path(Path::new("data.json.gz")).unwrap();
//! let executor = SearchExecutor::new(&corpus);
//!
//! let query = normalize_for_search("Trencar el GEL");
//! let page = executor.search(&query, SearchMode::Contains, 1, 10);
//!
//! println!("{} matches", page.total);
//! for entry in page.entries {
//!     println!("{} ({})", entry.title, entry.concept);
//! }
//! ```

pub mod corpus;
pub mod output;
pub mod query;
#[cfg(all(unix, feature = "daemon"))]
pub mod server;
pub mod utils;
