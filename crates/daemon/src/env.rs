// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level configuration (§9 "Configuration"): CLI flags take
//! precedence over environment variables, which take precedence over
//! defaults rooted at [`dirs::state_dir`].

use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_STATE_DIR: &str = "QUEUECTL_STATE_DIR";
pub const ENV_BIND_ADDR: &str = "QUEUECTL_BIND_ADDR";
pub const ENV_WORKERS: &str = "QUEUECTL_WORKERS";

pub const DEFAULT_WORKER_COUNT: usize = 3;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7878";

/// Resolve the state directory: `override_dir`, else `$QUEUECTL_STATE_DIR`,
/// else `dirs::state_dir()/queuectl`, else `./.queuectl`.
pub fn resolve_state_dir(override_dir: Option<PathBuf>) -> PathBuf {
    override_dir
        .or_else(|| std::env::var_os(ENV_STATE_DIR).map(PathBuf::from))
        .or_else(|| dirs::state_dir().map(|d| d.join("queuectl")))
        .unwrap_or_else(|| PathBuf::from(".queuectl"))
}

pub fn resolve_bind_addr(override_addr: Option<String>) -> anyhow::Result<SocketAddr> {
    let raw = override_addr
        .or_else(|| std::env::var(ENV_BIND_ADDR).ok())
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    raw.parse()
        .map_err(|err| anyhow::anyhow!("invalid bind address {raw:?}: {err}"))
}

pub fn resolve_worker_count(override_count: Option<usize>) -> usize {
    override_count
        .or_else(|| {
            std::env::var(ENV_WORKERS)
                .ok()
                .and_then(|v| v.parse().ok())
        })
        .unwrap_or(DEFAULT_WORKER_COUNT)
}

/// Locate the `queuectl-worker` executable: next to the daemon's own
/// binary, falling back to a bare `queuectl-worker` resolved via `PATH`.
pub fn resolve_worker_bin() -> PathBuf {
    let sibling = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("queuectl-worker")));
    match sibling {
        Some(path) if path.exists() => path,
        _ => PathBuf::from("queuectl-worker"),
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
