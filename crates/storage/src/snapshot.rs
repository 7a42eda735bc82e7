// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-consistent snapshotting (§4.1, §6 "on-disk state"): the in-memory
//! database is periodically backed up onto a temporary file and the file is
//! atomically renamed over the canonical `queue.db`. Loading reverses the
//! process: a file-backed connection is opened and its contents are backed
//! up *into* the in-memory connection.
//!
//! A snapshot that fails to open is rotated to `queue.db.bak` (keeping one
//! generation of history) rather than refusing to start — a corrupt
//! snapshot should never prevent the daemon from booting.

use rusqlite::backup::Backup;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::StoreError;
use crate::store::Store;

pub const SNAPSHOT_FILE: &str = "queue.db";
pub const SNAPSHOT_TMP: &str = "queue.db.tmp";
pub const SNAPSHOT_BAK: &str = "queue.db.bak";

fn backup_between(src: &Connection, dst: &mut Connection) -> rusqlite::Result<()> {
    let backup = Backup::new(src, dst)?;
    backup.run_to_completion(64, Duration::from_millis(0), None)
}

impl Store {
    /// Open a store rooted at `state_dir`, restoring `queue.db` if present.
    /// A corrupt or unreadable snapshot is rotated to `queue.db.bak` and the
    /// store starts empty rather than failing the boot.
    pub fn load_or_init(state_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(state_dir)?;
        let store = Store::open_in_memory()?;
        let snapshot_path = state_dir.join(SNAPSHOT_FILE);
        if snapshot_path.exists() {
            match Self::try_restore(&store, &snapshot_path) {
                Ok(()) => {
                    tracing::info!(path = %snapshot_path.display(), "restored snapshot");
                }
                Err(err) => {
                    tracing::warn!(
                        path = %snapshot_path.display(),
                        error = %err,
                        "snapshot failed to load, rotating to .bak and starting empty"
                    );
                    let bak_path = state_dir.join(SNAPSHOT_BAK);
                    let _ = std::fs::remove_file(&bak_path);
                    std::fs::rename(&snapshot_path, &bak_path)?;
                }
            }
        }
        store.clear_dirty();
        Ok(store)
    }

    fn try_restore(store: &Store, path: &Path) -> Result<(), StoreError> {
        let file_conn = Connection::open(path)?;
        // A corrupt SQLite file fails its first real query, not `open()`.
        file_conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |_| Ok(()))?;
        let mut mem_conn = store.lock_conn();
        Ok(backup_between(&file_conn, &mut mem_conn)?)
    }

    /// Write the current state to `state_dir/queue.db` via write-temp,
    /// fsync, then rename (§4.1). Clears the dirty flag only on success;
    /// callers should leave it set and retry on the next interval if this
    /// returns an error (§7 Store-transient).
    pub fn snapshot_to(&self, state_dir: &Path) -> Result<(), StoreError> {
        let tmp_path = state_dir.join(SNAPSHOT_TMP);
        let final_path = state_dir.join(SNAPSHOT_FILE);
        {
            let mut tmp_conn = Connection::open(&tmp_path)?;
            let src_conn = self.lock_conn();
            backup_between(&src_conn, &mut tmp_conn)?;
            drop(src_conn);
            tmp_conn.execute_batch("PRAGMA wal_checkpoint(FULL);")?;
        }
        let tmp_file = std::fs::File::open(&tmp_path)?;
        tmp_file.sync_all()?;
        drop(tmp_file);
        std::fs::rename(&tmp_path, &final_path)?;
        self.clear_dirty();
        Ok(())
    }

    pub fn snapshot_path(state_dir: &Path) -> PathBuf {
        state_dir.join(SNAPSHOT_FILE)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
