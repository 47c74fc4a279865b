//! Client for connecting to the corpus server daemon

use crate::query::SearchMode;
use crate::server::get_socket_path;
use crate::server::protocol::{
    read_message, write_message, ConceptResponse, LetterSummary, Request, Response,
    SearchResponse, StatusResponse,
};
use std::io::{BufReader, BufWriter};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Read/write timeout
const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in client operations
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("corpus server is not running")]
    NotRunning,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),

    #[error("invalid response from server")]
    InvalidResponse,
}

/// Client for the corpus server
pub struct CorpusClient {
    reader: BufReader<UnixStream>,
    writer: BufWriter<UnixStream>,
}

impl CorpusClient {
    /// Try to connect to the running daemon
    /// Returns None if daemon is not running (allowing fallback to direct mode)
    pub fn connect() -> Option<Self> {
        Self::connect_at(&get_socket_path())
    }

    /// Connect to a daemon listening on a specific socket
    pub fn connect_at(socket_path: &Path) -> Option<Self> {
        if !socket_path.exists() {
            return None;
        }

        let stream = UnixStream::connect(socket_path).ok()?;
        let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
        let _ = stream.set_write_timeout(Some(IO_TIMEOUT));

        let reader = BufReader::new(stream.try_clone().ok()?);
        let writer = BufWriter::new(stream);

        Some(Self { reader, writer })
    }

    /// Connect or return an error (for when daemon is required)
    pub fn connect_required() -> ClientResult<Self> {
        Self::connect().ok_or(ClientError::NotRunning)
    }

    /// Send one request and read its response, turning server errors into `Err`
    fn call(&mut self, request: &Request) -> ClientResult<Response> {
        write_message(&mut self.writer, request)?;
        match read_message(&mut self.reader)? {
            Response::Error { message } => Err(ClientError::Server(message)),
            response => Ok(response),
        }
    }

    /// Search with a raw query; the server normalizes it
    pub fn search(
        &mut self,
        query: &str,
        mode: SearchMode,
        page: usize,
        page_size: usize,
    ) -> ClientResult<SearchResponse> {
        let request = Request::Search {
            query: query.to_string(),
            mode,
            page,
            page_size,
        };

        match self.call(&request)? {
            Response::Search(sr) => Ok(sr),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Entries of the concept a slug refers to
    pub fn concept(&mut self, slug: &str) -> ClientResult<ConceptResponse> {
        let request = Request::Concept {
            slug: slug.to_string(),
        };

        match self.call(&request)? {
            Response::Concept(cr) => Ok(cr),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Concepts listed under a letter
    pub fn letter(&mut self, letter: &str) -> ClientResult<Vec<String>> {
        let request = Request::Letter {
            letter: letter.to_string(),
        };

        match self.call(&request)? {
            Response::Letter { concepts, .. } => Ok(concepts),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Letters with at least one concept
    pub fn letters(&mut self) -> ClientResult<Vec<LetterSummary>> {
        match self.call(&Request::Letters)? {
            Response::Letters { letters } => Ok(letters),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Whether a phrase exists in the corpus
    pub fn phrase_exists(&mut self, phrase: &str) -> ClientResult<bool> {
        let request = Request::PhraseExists {
            phrase: phrase.to_string(),
        };

        match self.call(&request)? {
            Response::PhraseExists { exists } => Ok(exists),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Get server status
    pub fn status(&mut self) -> ClientResult<StatusResponse> {
        match self.call(&Request::Status)? {
            Response::Status(status) => Ok(status),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Request a corpus reload, from the current file or a new one
    pub fn reload(&mut self, data_path: Option<PathBuf>) -> ClientResult<(bool, String)> {
        match self.call(&Request::Reload { data_path })? {
            Response::Reloaded { success, message } => Ok((success, message)),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Request graceful shutdown
    pub fn shutdown(&mut self) -> ClientResult<()> {
        match self.call(&Request::Shutdown)? {
            Response::ShuttingDown => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }

    /// Ping the server
    pub fn ping(&mut self) -> ClientResult<()> {
        match self.call(&Request::Ping)? {
            Response::Pong => Ok(()),
            _ => Err(ClientError::InvalidResponse),
        }
    }
}
