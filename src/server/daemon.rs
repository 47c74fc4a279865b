//! Unix corpus server daemon
//!
//! Keeps the corpus loaded in memory and serves lookups over a Unix socket.
//! A reload builds a complete new snapshot before swapping it in; requests
//! already running keep the snapshot they started with.

use crate::corpus::{load_from_path, Corpus, SnapshotCell};
use crate::query::{PageInfo, SearchExecutor, SearchMode};
use crate::server::protocol::{
    decode_message, read_frame, write_message, ConceptResponse, LetterSummary, Request, Response,
    SearchResponse, StatusResponse,
};
use crate::server::{get_pid_path, get_socket_path, read_pid, CorpusClient};
use crate::utils::{is_valid_letter, normalize_for_search};
use anyhow::{Context, Result};
use lru::LruCache;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind};
use std::num::NonZeroUsize;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default per-read and per-write timeout on client connections
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the detached daemon reports a fatal error
const ERROR_LOG_PATH: &str = "/tmp/dsff-daemon-error.log";

/// Ranked entry positions keyed by normalized query and mode
type RankingCache = LruCache<(String, SearchMode), Arc<Vec<usize>>>;

/// A corpus snapshot with the rankings computed against it.
///
/// The cache lives and dies with the snapshot, so positions cached for one
/// corpus are never applied to another.
struct LoadedCorpus {
    corpus: Corpus,
    data_path: PathBuf,
    loaded_at: Instant,
    rankings: Mutex<RankingCache>,
}

impl LoadedCorpus {
    fn new(corpus: Corpus, data_path: PathBuf, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            corpus,
            data_path,
            loaded_at: Instant::now(),
            rankings: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn cached_ranking(&self, key: &(String, SearchMode)) -> Option<Arc<Vec<usize>>> {
        let mut cache = self.rankings.lock().ok()?;
        cache.get(key).cloned()
    }

    fn store_ranking(&self, key: (String, SearchMode), ranked: Arc<Vec<usize>>) {
        if let Ok(mut cache) = self.rankings.lock() {
            cache.put(key, ranked);
        }
    }
}

/// Statistics for the server
struct ServerStats {
    start_time: Instant,
    queries_served: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    reloads: AtomicU64,
}

impl ServerStats {
    fn new() -> Self {
        Self {
            start_time: Instant::now(),
            queries_served: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            reloads: AtomicU64::new(0),
        }
    }

    fn cache_hit_rate(&self) -> f32 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f32 / total as f32
        }
    }
}

/// The corpus server daemon
pub struct CorpusServer {
    snapshot: SnapshotCell<LoadedCorpus>,
    cache_size: usize,
    socket_path: PathBuf,
    pid_path: PathBuf,
    connection_timeout: Duration,
    stats: ServerStats,
    shutdown: AtomicBool,
}

impl CorpusServer {
    /// Create a server for an already loaded corpus, on the per-user socket
    pub fn new(corpus: Corpus, data_path: PathBuf, cache_size: usize) -> Self {
        Self {
            snapshot: SnapshotCell::new(LoadedCorpus::new(corpus, data_path, cache_size)),
            cache_size,
            socket_path: get_socket_path(),
            pid_path: get_pid_path(),
            connection_timeout: CONNECTION_TIMEOUT,
            stats: ServerStats::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Listen on another socket and PID file
    pub fn at_paths(mut self, socket_path: PathBuf, pid_path: PathBuf) -> Self {
        self.socket_path = socket_path;
        self.pid_path = pid_path;
        self
    }

    /// Use another read/write timeout on accepted connections
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Start the server (blocking)
    pub fn run(self: &Arc<Self>) -> Result<()> {
        let socket_path = &self.socket_path;
        let pid_path = &self.pid_path;

        if let Some(parent) = socket_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Remove stale socket file
        if socket_path.exists() {
            fs::remove_file(socket_path)?;
        }

        fs::write(pid_path, format!("{}", std::process::id()))?;

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind to {}", socket_path.display()))?;

        // Set socket permissions (user only)
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(socket_path, fs::Permissions::from_mode(0o600))?;
        }

        info!(socket = %socket_path.display(), "listening");

        for stream in listener.incoming() {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            match stream {
                Ok(stream) => {
                    let _ = stream.set_read_timeout(Some(self.connection_timeout));
                    let _ = stream.set_write_timeout(Some(self.connection_timeout));

                    let server = Arc::clone(self);
                    thread::spawn(move || {
                        if let Err(e) = server.handle_connection(stream) {
                            debug!(error = %e, "connection closed with error");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                }
            }
        }

        let _ = fs::remove_file(socket_path);
        let _ = fs::remove_file(pid_path);
        info!("server stopped");

        Ok(())
    }

    /// Handle a single client connection
    fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = BufWriter::new(stream);

        loop {
            // A read timeout before the first byte of a frame is just an idle
            // client. The connection stays open and nothing is written.
            match reader.fill_buf() {
                Ok([]) => break,
                Ok(_) => {}
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    if self.shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    continue;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }

            // Once a frame has started, any read failure leaves the stream at
            // an unknown offset, so the connection is dropped.
            let frame = match read_frame(&mut reader) {
                Ok(frame) => frame,
                Err(e) => {
                    debug!(error = %e, "dropping connection after a bad frame");
                    break;
                }
            };

            let request: Request = match decode_message(&frame) {
                Ok(req) => req,
                Err(e) => {
                    let resp = Response::Error {
                        message: format!("Invalid request: {}", e),
                    };
                    write_message(&mut writer, &resp)?;
                    continue;
                }
            };

            let response = self.handle_request(request);
            write_message(&mut writer, &response)?;

            if matches!(response, Response::ShuttingDown) {
                // The accept loop only sees the flag on its next connection
                let _ = UnixStream::connect(&self.socket_path);
                break;
            }
        }

        Ok(())
    }

    /// Handle a single request
    fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::Search {
                query,
                mode,
                page,
                page_size,
            } => self.handle_search(&query, mode, page, page_size),

            Request::Concept { slug } => self.handle_concept(&slug),

            Request::Letter { letter } => self.handle_letter(letter),

            Request::Letters => self.handle_letters(),

            Request::PhraseExists { phrase } => Response::PhraseExists {
                exists: self.snapshot.load().corpus.phrase_exists(&phrase),
            },

            Request::Status => self.handle_status(),

            Request::Reload { data_path } => self.handle_reload(data_path),

            Request::Shutdown => {
                info!("shutdown requested");
                self.shutdown.store(true, Ordering::Relaxed);
                Response::ShuttingDown
            }

            Request::Ping => Response::Pong,
        }
    }

    /// Handle a search request
    fn handle_search(&self, query: &str, mode: SearchMode, page: usize, page_size: usize) -> Response {
        let start = Instant::now();
        let loaded = self.snapshot.load();
        let executor = SearchExecutor::new(&loaded.corpus);

        // Page parameters arrive from outside; clamp instead of rejecting
        let page = page.max(1);
        let page_size = page_size.max(1);

        let normalized = normalize_for_search(query);
        let key = (normalized, mode);

        let (ranked, cached) = match loaded.cached_ranking(&key) {
            Some(ranked) => {
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                (ranked, true)
            }
            None => {
                self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
                let ranked = Arc::new(executor.rank(&key.0, mode));
                loaded.store_ranking(key.clone(), Arc::clone(&ranked));
                (ranked, false)
            }
        };

        let result = executor.page(&ranked, page, page_size);
        self.stats.queries_served.fetch_add(1, Ordering::Relaxed);

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            query = %key.0,
            mode = mode.name(),
            total = result.total,
            cached,
            duration_ms,
            "search"
        );

        Response::Search(SearchResponse {
            normalized_query: key.0,
            mode,
            page: PageInfo::new(page, result.total, page_size),
            total: result.total,
            entries: result.entries,
            duration_ms,
            cached,
        })
    }

    fn handle_concept(&self, slug: &str) -> Response {
        let loaded = self.snapshot.load();
        let entries = SearchExecutor::new(&loaded.corpus).entries_for_slug(slug);
        let concept = entries.first().map(|entry| entry.concept.clone());
        Response::Concept(ConceptResponse { concept, entries })
    }

    fn handle_letter(&self, letter: String) -> Response {
        if !is_valid_letter(&letter) {
            return Response::Error {
                message: format!("Invalid letter: {:?}", letter),
            };
        }

        let loaded = self.snapshot.load();
        let concepts = loaded
            .corpus
            .concepts_for_letter(&letter)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        Response::Letter { letter, concepts }
    }

    fn handle_letters(&self) -> Response {
        let loaded = self.snapshot.load();
        let letters = loaded
            .corpus
            .concepts_by_letter()
            .iter()
            .map(|(letter, concepts)| LetterSummary {
                letter: letter.clone(),
                concepts: concepts.len(),
            })
            .collect();
        Response::Letters { letters }
    }

    /// Handle status request
    fn handle_status(&self) -> Response {
        let loaded = self.snapshot.load();

        Response::Status(StatusResponse {
            uptime_secs: self.stats.start_time.elapsed().as_secs(),
            corpus_age_secs: loaded.loaded_at.elapsed().as_secs(),
            data_path: loaded.data_path.clone(),
            entries: loaded.corpus.len(),
            letters: loaded.corpus.letter_count(),
            queries_served: self.stats.queries_served.load(Ordering::Relaxed),
            cache_hit_rate: self.stats.cache_hit_rate(),
            reloads: self.stats.reloads.load(Ordering::Relaxed),
        })
    }

    /// Handle reload request
    ///
    /// The current snapshot keeps serving while the new file loads, and stays
    /// in place if loading fails.
    fn handle_reload(&self, data_path: Option<PathBuf>) -> Response {
        let data_path = data_path.unwrap_or_else(|| self.snapshot.load().data_path.clone());

        match load_from_path(&data_path) {
            Ok(corpus) => {
                let entries = corpus.len();
                self.snapshot
                    .swap(LoadedCorpus::new(corpus, data_path.clone(), self.cache_size));
                self.stats.reloads.fetch_add(1, Ordering::Relaxed);
                info!(path = %data_path.display(), entries, "corpus reloaded");
                Response::Reloaded {
                    success: true,
                    message: format!("Reloaded {} entries from {}", entries, data_path.display()),
                }
            }
            Err(e) => {
                warn!(path = %data_path.display(), error = %e, "reload failed, keeping current corpus");
                Response::Reloaded {
                    success: false,
                    message: format!("Failed to reload: {}", e),
                }
            }
        }
    }
}

/// Daemonize the current process and serve `corpus` from the detached child
pub fn daemonize(corpus: Corpus, data_path: PathBuf, cache_size: usize) -> Result<()> {
    // Double fork so the daemon can never acquire a controlling terminal
    match unsafe { libc::fork() } {
        -1 => anyhow::bail!("First fork failed"),
        0 => {
            if unsafe { libc::setsid() } == -1 {
                anyhow::bail!("setsid failed");
            }

            match unsafe { libc::fork() } {
                -1 => anyhow::bail!("Second fork failed"),
                0 => {
                    unsafe {
                        libc::close(0);
                        libc::close(1);
                        libc::close(2);

                        let null = libc::open(c"/dev/null".as_ptr(), libc::O_RDWR);
                        if null != -1 {
                            libc::dup2(null, 0);
                            libc::dup2(null, 1);
                            libc::dup2(null, 2);
                            if null > 2 {
                                libc::close(null);
                            }
                        }
                    }

                    // Avoid holding mounts
                    let _ = std::env::set_current_dir("/");

                    let server = Arc::new(CorpusServer::new(corpus, data_path, cache_size));
                    if let Err(e) = server.run() {
                        // stderr is gone at this point
                        let _ = fs::write(ERROR_LOG_PATH, format!("{:#}", e));
                    }
                    std::process::exit(0);
                }
                _ => std::process::exit(0),
            }
        }
        _ => {
            // Parent waits for the first child only
            unsafe {
                let mut status: libc::c_int = 0;
                libc::wait(&mut status);
            }
            Ok(())
        }
    }
}

/// Start the daemon in foreground (for debugging)
pub fn run_foreground(corpus: Corpus, data_path: PathBuf, cache_size: usize) -> Result<()> {
    let server = Arc::new(CorpusServer::new(corpus, data_path, cache_size));
    server.run()
}

/// Stop the running daemon
///
/// Asks for a graceful shutdown first and falls back to signals when the
/// daemon does not answer.
pub fn stop_daemon() -> Result<bool> {
    let pid_path = get_pid_path();
    let Some(pid) = read_pid() else {
        return Ok(false);
    };

    if let Some(mut client) = CorpusClient::connect()
        && client.shutdown().is_ok()
        && wait_for_exit(pid, Duration::from_secs(2))
    {
        return Ok(true);
    }

    unsafe {
        if libc::kill(pid, libc::SIGTERM) == 0 && !wait_for_exit(pid, Duration::from_millis(1500)) {
            error!(pid, "daemon ignored SIGTERM, sending SIGKILL");
            libc::kill(pid, libc::SIGKILL);
        }
    }

    let _ = fs::remove_file(get_socket_path());
    let _ = fs::remove_file(&pid_path);

    Ok(true)
}

/// Poll until `pid` is gone or `timeout` passes
fn wait_for_exit(pid: i32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if unsafe { libc::kill(pid, 0) } != 0 {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    false
}

/// Block until something is listening on `socket_path`
pub fn wait_for_socket(socket_path: &Path, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if UnixStream::connect(socket_path).is_ok() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Entry;
    use tempfile::TempDir;

    fn sample_corpus() -> Corpus {
        Corpus::from_entries(vec![
            Entry::new("trencar el gel", "GEL"),
            Entry::new("ésser de gel", "GEL").with_antonym(true),
            Entry::new("bufar gel", "GEL"),
            Entry::new("fer (algú) el préssec", "ENGANYAR"),
            Entry::new("anar de bòlit", "ÀNSIA"),
        ])
        .unwrap()
    }

    fn server_in(dir: &TempDir) -> CorpusServer {
        CorpusServer::new(sample_corpus(), dir.path().join("data.json"), 8)
            .at_paths(dir.path().join("dsff.sock"), dir.path().join("dsff.pid"))
    }

    fn search(server: &CorpusServer, query: &str, mode: SearchMode, page: usize) -> SearchResponse {
        let request = Request::Search {
            query: query.to_string(),
            mode,
            page,
            page_size: 2,
        };
        match server.handle_request(request) {
            Response::Search(sr) => sr,
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_search_normalizes_and_caches() {
        let dir = TempDir::new().unwrap();
        let server = server_in(&dir);

        let first = search(&server, "  GEL ", SearchMode::Contains, 1);
        assert_eq!(first.normalized_query, "gel");
        assert_eq!(first.total, 3);
        assert_eq!(first.entries.len(), 2);
        assert_eq!(first.page.next, Some(2));
        assert!(!first.cached);

        let second = search(&server, "gel", SearchMode::Contains, 2);
        assert!(second.cached);
        assert_eq!(second.entries.len(), 1);
        assert_eq!(second.page.previous, Some(1));

        // Different mode is a different cache key
        let ends = search(&server, "gel", SearchMode::EndsWith, 1);
        assert!(!ends.cached);
    }

    #[test]
    fn test_page_zero_is_clamped() {
        let dir = TempDir::new().unwrap();
        let server = server_in(&dir);

        let page = search(&server, "gel", SearchMode::Contains, 0);
        assert_eq!(page.page.current, 1);
        assert_eq!(page.entries.len(), 2);
    }

    #[test]
    fn test_concept_letter_and_phrase_requests() {
        let dir = TempDir::new().unwrap();
        let server = server_in(&dir);

        match server.handle_request(Request::Concept { slug: "gel".to_string() }) {
            Response::Concept(cr) => {
                assert_eq!(cr.concept.as_deref(), Some("GEL"));
                assert_eq!(cr.entries.len(), 3);
                assert!(cr.entries[2].antonym);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        match server.handle_request(Request::Letter { letter: "A".to_string() }) {
            Response::Letter { concepts, .. } => assert_eq!(concepts, vec!["ÀNSIA"]),
            other => panic!("unexpected response: {:?}", other),
        }

        assert!(matches!(
            server.handle_request(Request::Letter { letter: "Q".to_string() }),
            Response::Letter { ref concepts, .. } if concepts.is_empty()
        ));
        assert!(matches!(
            server.handle_request(Request::Letter { letter: "ab".to_string() }),
            Response::Error { .. }
        ));

        assert!(matches!(
            server.handle_request(Request::PhraseExists { phrase: "fer el préssec".to_string() }),
            Response::PhraseExists { exists: true }
        ));
    }

    #[test]
    fn test_failed_reload_keeps_current_corpus() {
        let dir = TempDir::new().unwrap();
        let server = server_in(&dir);

        let response = server.handle_request(Request::Reload {
            data_path: Some(dir.path().join("missing.json.gz")),
        });
        assert!(matches!(response, Response::Reloaded { success: false, .. }));

        assert_eq!(search(&server, "gel", SearchMode::Contains, 1).total, 3);
    }

    #[test]
    fn test_reload_swaps_corpus_and_cache() {
        let dir = TempDir::new().unwrap();
        let server = server_in(&dir);
        assert_eq!(search(&server, "gel", SearchMode::Contains, 1).total, 3);

        let next = dir.path().join("next.json");
        fs::write(&next, r#"[{"title": "bufar gel", "concepte": "GEL"}]"#).unwrap();

        let response = server.handle_request(Request::Reload {
            data_path: Some(next.clone()),
        });
        assert!(matches!(response, Response::Reloaded { success: true, .. }));

        let after = search(&server, "gel", SearchMode::Contains, 1);
        assert_eq!(after.total, 1);
        assert!(!after.cached);

        match server.handle_request(Request::Status) {
            Response::Status(status) => {
                assert_eq!(status.entries, 1);
                assert_eq!(status.data_path, next);
                assert_eq!(status.reloads, 1);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    /// Run `server` on a background thread until it is shut down
    fn spawn_server(server: CorpusServer) -> (Arc<CorpusServer>, thread::JoinHandle<Result<()>>) {
        let server = Arc::new(server);
        let handle = {
            let server = Arc::clone(&server);
            thread::spawn(move || server.run())
        };
        assert!(wait_for_socket(&server.socket_path, Duration::from_secs(5)));
        (server, handle)
    }

    #[test]
    fn test_idle_connection_stays_in_sync() {
        let dir = TempDir::new().unwrap();
        let socket_path = dir.path().join("dsff.sock");
        let (_server, handle) =
            spawn_server(server_in(&dir).with_connection_timeout(Duration::from_millis(100)));

        let mut client = CorpusClient::connect_at(&socket_path).unwrap();
        client.ping().unwrap();

        // Several server read timeouts pass with nothing on the wire
        thread::sleep(Duration::from_millis(350));

        client.ping().unwrap();
        let result = client.search("gel", SearchMode::Contains, 1, 10).unwrap();
        assert_eq!(result.total, 3);

        client.shutdown().unwrap();
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_oversized_frame_closes_connection() {
        use std::io::{Read, Write};

        let dir = TempDir::new().unwrap();
        let socket_path = dir.path().join("dsff.sock");
        let (_server, handle) = spawn_server(server_in(&dir));

        let mut raw = UnixStream::connect(&socket_path).unwrap();
        raw.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        raw.write_all(&u32::MAX.to_le_bytes()).unwrap();

        // No error frame comes back; the server hangs up
        let mut rest = Vec::new();
        raw.read_to_end(&mut rest).unwrap();
        assert!(rest.is_empty());

        // Other connections are unaffected
        let mut client = CorpusClient::connect_at(&socket_path).unwrap();
        client.ping().unwrap();
        client.shutdown().unwrap();
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_undecodable_request_gets_error_reply() {
        use std::io::Write;

        let dir = TempDir::new().unwrap();
        let socket_path = dir.path().join("dsff.sock");
        let (_server, handle) = spawn_server(server_in(&dir));

        let mut raw = UnixStream::connect(&socket_path).unwrap();
        raw.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        raw.write_all(&5u32.to_le_bytes()).unwrap();
        raw.write_all(b"{nope").unwrap();

        let reply: Response = crate::server::protocol::read_message(&mut raw).unwrap();
        assert!(matches!(reply, Response::Error { .. }));

        // Same connection, next request
        write_message(&mut raw, &Request::Ping).unwrap();
        let reply: Response = crate::server::protocol::read_message(&mut raw).unwrap();
        assert!(matches!(reply, Response::Pong));

        write_message(&mut raw, &Request::Shutdown).unwrap();
        handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_socket_roundtrip_and_shutdown() {
        let dir = TempDir::new().unwrap();
        let socket_path = dir.path().join("dsff.sock");
        let server = Arc::new(server_in(&dir));

        let handle = {
            let server = Arc::clone(&server);
            thread::spawn(move || server.run())
        };
        assert!(wait_for_socket(&socket_path, Duration::from_secs(5)));

        let mut client = CorpusClient::connect_at(&socket_path).unwrap();
        client.ping().unwrap();

        let result = client.search("gel", SearchMode::Contains, 1, 10).unwrap();
        assert_eq!(result.total, 3);
        assert_eq!(result.entries[0].title, "bufar gel");

        assert!(client.phrase_exists("trencar el gel").unwrap());
        assert!(matches!(client.letter("1"), Err(crate::server::ClientError::Server(_))));

        client.shutdown().unwrap();
        handle.join().unwrap().unwrap();
        assert!(!socket_path.exists());
    }
}
