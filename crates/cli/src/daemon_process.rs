// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management: starting `queuectld` in the background and
//! probing whether it has become reachable (§9 "the CLI may auto-start the
//! daemon ... bounded to one restart attempt per invocation").

use std::process::Command;
use std::time::{Duration, Instant};

use crate::client::ClientError;
use crate::env;

/// Start `queuectld` detached from the CLI's stdio, returning the child
/// handle so the caller can detect an early exit (startup failure).
pub fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let daemon_path = env::resolve_daemon_bin();
    Command::new(&daemon_path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Poll `base_url`'s `/status` endpoint until it responds or `timeout`
/// elapses, failing fast if the child process exits in the meantime.
pub async fn wait_for_daemon(
    base_url: &str,
    mut child: std::process::Child,
    timeout: Duration,
) -> Result<(), ClientError> {
    let start = Instant::now();
    let http = reqwest::Client::new();
    while start.elapsed() < timeout {
        if let Ok(Some(status)) = child.try_wait() {
            return Err(ClientError::DaemonStartFailed(format!(
                "queuectld exited during startup: {status}"
            )));
        }
        if http.get(format!("{base_url}/status")).send().await.is_ok() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Err(ClientError::DaemonStartTimeout)
}
