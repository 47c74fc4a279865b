pub mod loader;
pub mod snapshot;
pub mod stats;
pub mod types;

pub use loader::{load_from_path, load_from_reader, LoadError};
pub use snapshot::{Corpus, SnapshotCell};
pub use types::Entry;
