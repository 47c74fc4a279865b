//! Protocol messages for client-server communication
//!
//! Uses a simple length-prefixed JSON protocol:
//! - 4 bytes (little-endian u32): message length
//! - N bytes: JSON-encoded message

use crate::corpus::Entry;
use crate::query::{PageInfo, SearchMode};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::PathBuf;

/// Largest message accepted from the wire
const MAX_MESSAGE_LEN: usize = 100 * 1024 * 1024;

/// Request from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Search the corpus
    Search {
        /// Raw query text, normalized by the server
        query: String,
        mode: SearchMode,
        /// 1-based page number
        page: usize,
        page_size: usize,
    },

    /// All entries of a concept, by URL slug
    Concept { slug: String },

    /// Concepts listed under one letter
    Letter { letter: String },

    /// Letters that have concepts
    Letters,

    /// Check whether a phrase exists as an entry
    PhraseExists { phrase: String },

    /// Check server health and get stats
    Status,

    /// Load the corpus again, optionally from another file
    Reload { data_path: Option<PathBuf> },

    /// Graceful shutdown request
    Shutdown,

    /// Ping for connection testing
    Ping,
}

/// Response from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Search results
    Search(SearchResponse),

    /// Entries of a concept
    Concept(ConceptResponse),

    /// Concepts of a letter (empty when the letter is unknown)
    Letter { letter: String, concepts: Vec<String> },

    /// Letter overview
    Letters { letters: Vec<LetterSummary> },

    /// Phrase existence answer
    PhraseExists { exists: bool },

    /// Server status
    Status(StatusResponse),

    /// Reload completed
    Reloaded { success: bool, message: String },

    /// Shutdown acknowledged
    ShuttingDown,

    /// Pong response
    Pong,

    /// Error response
    Error { message: String },
}

/// Search results response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Normalized form of the query that was searched
    pub normalized_query: String,
    pub mode: SearchMode,
    /// Entries on the requested page
    pub entries: Vec<Entry>,
    /// Matches across all pages
    pub total: usize,
    pub page: PageInfo,
    /// Time taken in milliseconds
    pub duration_ms: f64,
    /// Whether the ranking came from cache
    pub cached: bool,
}

/// Concept lookup response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptResponse {
    /// Concept name as stored in the corpus, if found
    pub concept: Option<String>,
    pub entries: Vec<Entry>,
}

/// Number of concepts under one letter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterSummary {
    pub letter: String,
    pub concepts: usize,
}

/// Server status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server uptime in seconds
    pub uptime_secs: u64,
    /// Seconds since the current corpus was loaded
    pub corpus_age_secs: u64,
    /// Corpus file in use
    pub data_path: PathBuf,
    pub entries: usize,
    pub letters: usize,
    /// Total queries served
    pub queries_served: u64,
    /// Cache hit rate (0.0 - 1.0)
    pub cache_hit_rate: f32,
    /// Successful reloads since start
    pub reloads: u64,
}

/// Write a message to a stream with length prefix
pub fn write_message<W: Write>(writer: &mut W, msg: &impl Serialize) -> std::io::Result<()> {
    let json = serde_json::to_vec(msg).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })?;

    let len = u32::try_from(json.len()).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, "Message too large")
    })?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()?;

    Ok(())
}

/// Read one length-prefixed frame without decoding it
///
/// Errors leave the stream at an unknown offset; callers should drop it.
pub fn read_frame<R: Read>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Message too large",
        ));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Decode a frame read by [`read_frame`]
pub fn decode_message<T: for<'de> Deserialize<'de>>(frame: &[u8]) -> std::io::Result<T> {
    serde_json::from_slice(frame).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })
}

/// Read a message from a stream with length prefix
pub fn read_message<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> std::io::Result<T> {
    let frame = read_frame(reader)?;
    decode_message(&frame)
}
