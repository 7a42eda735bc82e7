// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI-side process configuration. Shares the `QUEUECTL_*` environment
//! variables with `queuectld` (§9 "Configuration") so both halves agree on
//! where the daemon lives without either side hardcoding the other's
//! defaults.

pub use qc_daemon::env::{
    resolve_bind_addr, resolve_state_dir, DEFAULT_BIND_ADDR, ENV_BIND_ADDR, ENV_STATE_DIR,
};

/// Base URL for the Control API, e.g. `http://127.0.0.1:7878`.
pub fn resolve_base_url(override_addr: Option<String>) -> anyhow::Result<String> {
    let addr = resolve_bind_addr(override_addr)?;
    Ok(format!("http://{addr}"))
}

/// Locate the `queuectld` executable: next to the CLI's own binary, falling
/// back to a bare `queuectld` resolved via `PATH`.
pub fn resolve_daemon_bin() -> std::path::PathBuf {
    let sibling = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("queuectld")));
    match sibling {
        Some(path) if path.exists() => path,
        _ => std::path::PathBuf::from("queuectld"),
    }
}
