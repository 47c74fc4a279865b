//! Persistent corpus server for warm lookups
//!
//! This module provides a daemon that keeps the decompressed corpus and its
//! indexes in memory, so searches skip the cold-start load.
//!
//! Architecture:
//! - daemon: loads the corpus, listens on a Unix socket, answers requests
//! - client: connects to the socket, sends requests, receives responses
//! - fallback: if the daemon is unavailable, the CLI loads the corpus itself

mod client;
pub mod daemon;
pub mod protocol;

pub use client::{ClientError, ClientResult, CorpusClient};

use std::path::PathBuf;

const SOCKET_NAME: &str = "dsff.sock";
const PID_NAME: &str = "dsff.pid";

/// Per-user location for a runtime file, falling back to /tmp keyed by uid
fn runtime_path(file_name: &str, extension: &str) -> PathBuf {
    // XDG_RUNTIME_DIR is tmpfs-backed and private to the user
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(file_name);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".local").join("run").join(file_name);
    }

    let uid = unsafe { libc::getuid() };
    PathBuf::from(format!("/tmp/dsff-{}.{}", uid, extension))
}

/// Get the socket path for the corpus server
pub fn get_socket_path() -> PathBuf {
    runtime_path(SOCKET_NAME, "sock")
}

/// Get the PID file path for the daemon
pub fn get_pid_path() -> PathBuf {
    runtime_path(PID_NAME, "pid")
}

/// Check if the daemon is running
pub fn is_daemon_running() -> bool {
    read_pid().is_some_and(|pid| unsafe { libc::kill(pid, 0) == 0 })
}

/// PID recorded by the running daemon, if any
pub(crate) fn read_pid() -> Option<i32> {
    let pid_str = std::fs::read_to_string(get_pid_path()).ok()?;
    pid_str.trim().parse::<i32>().ok()
}
