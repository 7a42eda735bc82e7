//! Test helpers for queuectl's behavioral specifications.
//!
//! Black-box: spawn a real `queuectld`, drive it through the real `queuectl`
//! binary, and assert on stdout/exit codes — no test-only shortcuts into the
//! engine or store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{Duration, Instant};

use tempfile::TempDir;

/// Resolve a workspace binary, matching cargo's debug output layout
/// (falls back to resolving relative to the test binary itself so this
/// also works when `CARGO_MANIFEST_DIR` is stale, e.g. under coverage).
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

fn queuectld_binary() -> PathBuf {
    binary_path("queuectld")
}

fn queuectl_binary() -> PathBuf {
    binary_path("queuectl")
}

/// Exposed for specs that need to run `queuectl` without a daemon at all
/// (e.g. `--help`/`--version`).
pub fn queuectl_path() -> PathBuf {
    queuectl_binary()
}

/// A unique loopback port per test, so a daemon left behind by a failed
/// teardown in one test can never collide with the next.
fn next_port() -> u16 {
    static COUNTER: AtomicU16 = AtomicU16::new(0);
    let offset = COUNTER.fetch_add(1, Ordering::SeqCst);
    20000 + ((std::process::id() as u16).wrapping_add(offset.wrapping_mul(7)) % 9000)
}

/// A running `queuectld` bound to a scratch state directory and a unique
/// loopback port, torn down on drop.
pub struct TestDaemon {
    child: Option<Child>,
    pub bind_addr: String,
    _state_dir: TempDir,
}

impl TestDaemon {
    /// Start a daemon with the §8 scenario defaults: `tick_interval_ms=100`,
    /// `save_interval_ms=1000`, `backoff_base=2`, `backoff_factor_ms=100`,
    /// `max_retries=2`, 3 workers.
    pub fn start() -> Self {
        Self::start_with_workers(3)
    }

    pub fn start_with_workers(workers: usize) -> Self {
        let state_dir = TempDir::new().expect("tempdir");
        let port = next_port();
        let bind_addr = format!("127.0.0.1:{port}");

        let child = Command::new(queuectld_binary())
            .env("QUEUECTL_STATE_DIR", state_dir.path())
            .env("QUEUECTL_BIND_ADDR", &bind_addr)
            .env("QUEUECTL_WORKERS", workers.to_string())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .expect("spawn queuectld");

        let mut daemon = Self {
            child: Some(child),
            bind_addr,
            _state_dir: state_dir,
        };
        daemon.wait_until_ready(Duration::from_secs(5));
        daemon.apply_scenario_defaults();
        daemon
    }

    fn wait_until_ready(&mut self, timeout: Duration) {
        let start = Instant::now();
        loop {
            if self.cli().args(&["status"]).output().map(|o| o.status.success()).unwrap_or(false) {
                return;
            }
            if start.elapsed() > timeout {
                panic!("queuectld did not become ready within {timeout:?}");
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    /// Apply the §8 scenario constants via the live config API.
    fn apply_scenario_defaults(&self) {
        for (key, value) in [
            ("tick_interval_ms", "100"),
            ("save_interval_ms", "1000"),
            ("backoff_base", "2"),
            ("backoff_factor_ms", "100"),
            ("max_retries", "2"),
        ] {
            self.cli()
                .args(&["config", "set", key, value])
                .output()
                .expect("config set should run");
        }
    }

    pub fn cli(&self) -> CliBuilder {
        CliBuilder::new(self.bind_addr.clone())
    }

    /// Send `/shutdown` and wait (bounded) for the process to exit.
    pub fn shutdown_and_wait(mut self, timeout: Duration) -> bool {
        let _ = self.cli().args(&["shutdown"]).output();
        let mut child = self.child.take().expect("child already reaped");
        let start = Instant::now();
        loop {
            if let Ok(Some(_)) = child.try_wait() {
                return true;
            }
            if start.elapsed() > timeout {
                let _ = child.kill();
                let _ = child.wait();
                return false;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    /// Kill the worker processes' parent daemon's *child* by PID — used by
    /// the crash-recovery scenario, which needs to kill a worker, not the
    /// daemon itself. Returns every `queuectl-worker` PID currently alive
    /// under this daemon's process group.
    pub fn kill_one_worker(&self) {
        // Workers are spawned by the daemon as direct children; `pgrep -P`
        // finds them by parent pid without needing a platform-specific API.
        let daemon_pid = self.child.as_ref().expect("daemon running").id();
        let output = Command::new("pgrep")
            .args(["-P", &daemon_pid.to_string()])
            .output();
        if let Ok(output) = output {
            if let Some(line) = String::from_utf8_lossy(&output.stdout).lines().next() {
                if let Ok(pid) = line.trim().parse::<i32>() {
                    let _ = Command::new("kill").args(["-9", &pid.to_string()]).status();
                }
            }
        }
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Fluent builder for `queuectl` invocations against a specific daemon.
pub struct CliBuilder {
    bind_addr: String,
    args: Vec<String>,
}

impl CliBuilder {
    fn new(bind_addr: String) -> Self {
        Self {
            bind_addr,
            args: Vec::new(),
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(queuectl_binary());
        cmd.args(&self.args);
        cmd.env("QUEUECTL_BIND_ADDR", &self.bind_addr);
        cmd
    }

    pub fn output(self) -> std::io::Result<Output> {
        self.command().output()
    }

    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{expected}'\nstdout: {stdout}"
        );
        self
    }
}

/// Parse the plain-text `queuectl status` line pair into (pending,
/// processing, completed, dead, idle_workers, processing_workers).
pub fn parse_status(stdout: &str) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for line in stdout.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("jobs:") {
            for field in rest.split_whitespace() {
                if let Some((k, v)) = field.split_once('=') {
                    let v: u64 = v.parse().unwrap_or(0);
                    match k {
                        "pending" => counts.pending = v,
                        "processing" => counts.processing = v,
                        "completed" => counts.completed = v,
                        "dead" => counts.dead = v,
                        _ => {}
                    }
                }
            }
        } else if let Some(rest) = line.strip_prefix("workers:") {
            for field in rest.split_whitespace() {
                if let Some((k, v)) = field.split_once('=') {
                    let v: u64 = v.parse().unwrap_or(0);
                    match k {
                        "processing" => counts.worker_processing = v,
                        "idle" => counts.worker_idle = v,
                        _ => {}
                    }
                }
            }
        }
    }
    counts
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub dead: u64,
    pub worker_processing: u64,
    pub worker_idle: u64,
}

/// Poll `f` until it returns `Some`, panicking if `timeout` elapses first.
pub fn poll_until<T>(timeout: Duration, mut f: impl FnMut() -> Option<T>) -> T {
    let start = Instant::now();
    loop {
        if let Some(value) = f() {
            return value;
        }
        if start.elapsed() > timeout {
            panic!("condition not met within {timeout:?}");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}
