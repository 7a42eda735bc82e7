// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance enforcement: a second `queuectld` pointed at the same
//! state directory must fail fast instead of racing the first one for the
//! snapshot file.

use fs2::FileExt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("another queuectld is already running against {0}")]
    AlreadyRunning(PathBuf),

    #[error("lock I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Holds the exclusive lock for the process's lifetime; dropping it (or
/// process exit) releases the lock.
pub struct InstanceLock {
    _file: std::fs::File,
}

/// Acquire the exclusive lock on `state_dir/daemon.lock`, writing our PID
/// into it. Fails immediately (non-blocking) if another process holds it.
pub fn acquire(state_dir: &Path) -> Result<InstanceLock, LockError> {
    let path = state_dir.join("daemon.lock");
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;
    file.try_lock_exclusive()
        .map_err(|_| LockError::AlreadyRunning(path.clone()))?;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(InstanceLock { _file: file })
}
