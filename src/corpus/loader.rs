//! Corpus loading: gzip/JSON decoding into an immutable [`Corpus`].

use crate::corpus::snapshot::Corpus;
use crate::corpus::types::Entry;
use flate2::read::GzDecoder;
use icu_provider::DataError;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// First two bytes of every gzip stream
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors that prevent a corpus from being served
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open data file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decompress corpus: {0}")]
    Decompress(#[source] io::Error),

    #[error("failed to decode corpus JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("entry {index} ({title:?}) has an empty concept")]
    MissingConcept { index: usize, title: String },

    #[error("corpus contains no entries")]
    Empty,

    #[error("failed to set up Catalan collation: {0}")]
    Collation(#[from] DataError),
}

/// Load a corpus from a file
pub fn load_from_path(path: &Path) -> Result<Corpus, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let corpus = load_from_reader(file)?;
    tracing::info!(
        path = %path.display(),
        entries = corpus.len(),
        letters = corpus.letter_count(),
        "loaded corpus"
    );
    Ok(corpus)
}

/// Load a corpus from a byte stream holding a JSON array of entries.
///
/// The stream may be gzip-compressed; compression is detected from the
/// magic bytes.
pub fn load_from_reader<R: Read>(reader: R) -> Result<Corpus, LoadError> {
    let entries = decode_entries(reader)?;
    Corpus::from_entries(entries)
}

/// Decode the entry array without building indexes
pub fn decode_entries<R: Read>(reader: R) -> Result<Vec<Entry>, LoadError> {
    let mut reader = BufReader::new(reader);
    let is_gzip = reader
        .fill_buf()
        .map_err(LoadError::Decompress)?
        .starts_with(&GZIP_MAGIC);

    if is_gzip {
        decode_json(GzDecoder::new(reader))
    } else {
        decode_json(reader)
    }
}

fn decode_json<R: Read>(reader: R) -> Result<Vec<Entry>, LoadError> {
    serde_json::from_reader(reader).map_err(|e| {
        if e.is_io() {
            // Corrupt or truncated gzip streams surface as I/O errors
            LoadError::Decompress(io::Error::other(e))
        } else {
            LoadError::Decode(e)
        }
    })
}
