//! Test helpers for behavioral specifications.
//!
//! Spawns the real `isxopsd` binary and drives it over HTTP/WebSocket, so
//! these specs exercise the same wire contract a real client would.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::net::TcpListener as StdTcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

pub const POLL_INTERVAL_MS: u64 = 10;
pub const WAIT_MAX_MS: u64 = 5000;

fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

fn isxopsd_binary() -> PathBuf {
    binary_path("isxopsd")
}

/// Finds a free TCP port by binding to port 0 and releasing it immediately.
/// Racy against other processes in principle, but good enough for
/// single-machine CI and unused by the time the daemon binds it a few
/// milliseconds later.
fn free_port() -> u16 {
    StdTcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

/// A running `isxopsd` instance, configured via `ISXOPS_*` env vars and
/// killed when dropped.
pub struct Daemon {
    child: Child,
    base_url: String,
}

pub struct DaemonBuilder {
    envs: Vec<(String, String)>,
}

impl DaemonBuilder {
    fn new() -> Self {
        Self { envs: Vec::new() }
    }

    pub fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.envs.push((key.to_string(), value.into()));
        self
    }

    pub fn start(self) -> Daemon {
        let port = free_port();
        let base_url = format!("http://127.0.0.1:{port}");

        let mut cmd = Command::new(isxopsd_binary());
        cmd.env("ISXOPS_BIND_ADDR", format!("127.0.0.1:{port}"))
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        for (key, value) in self.envs {
            cmd.env(key, value);
        }

        let child = cmd.spawn().expect("isxopsd should spawn");
        let daemon = Daemon { child, base_url };
        daemon.wait_ready();
        daemon
    }
}

impl Daemon {
    pub fn builder() -> DaemonBuilder {
        DaemonBuilder::new()
    }

    pub fn start() -> Self {
        Self::builder().start()
    }

    fn wait_ready(&self) {
        let client = reqwest::blocking::Client::new();
        let ready = wait_for(WAIT_MAX_MS, || {
            client
                .get(self.url("/healthz"))
                .timeout(Duration::from_millis(200))
                .send()
                .map(|r| r.status().is_success())
                .unwrap_or(false)
        });
        assert!(ready, "isxopsd did not become healthy in time");
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws{}{}", &self.base_url["http".len()..], path)
    }

    pub fn client(&self) -> reqwest::blocking::Client {
        reqwest::blocking::Client::new()
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Poll a condition until it returns true or the timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }
    false
}
