// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Job Store (C1): a relational store backed by an in-process SQLite
//! connection, wrapped with the dirty-flag/snapshot protocol of §4.1.
//!
//! All mutating operations run inside a single [`rusqlite::Connection`]
//! guarded by a mutex. Per §5, the core is single-threaded with respect to
//! state transitions; the mutex exists only so the snapshotter (running on
//! its own tick) and the scheduler can share the connection without a
//! dedicated actor.

use qc_core::id::{IdGen, UuidIdGen};
use qc_core::{ConfigKey, Job, JobId, JobState, JobSummary, NewJob};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::StoreError;
use crate::schema::{self, job_from_row, JOB_COLUMNS};

pub struct Store {
    conn: Mutex<Connection>,
    dirty: AtomicBool,
}

impl Store {
    /// Open a fresh, empty, in-memory store with the schema installed.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            dirty: AtomicBool::new(false),
        })
    }

    /// True if the store has mutated since the last successful snapshot.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Mark the store clean after a successful snapshot write. Only the
    /// snapshotter should call this.
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        Ok(f(&conn)?)
    }

    /// Lock and hand back the underlying connection directly. Only the
    /// snapshotter (which needs a `&mut Connection` for the backup API)
    /// should use this; every other operation goes through [`with_conn`].
    pub(crate) fn lock_conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a new job (§4.1 `enqueue`). Generates an id if none is
    /// supplied; fails with [`StoreError::DuplicateId`] on collision.
    pub fn enqueue(&self, job: NewJob, now: i64) -> Result<Job, StoreError> {
        if let Some(id) = job.id.as_ref() {
            if id.trim().is_empty() {
                return Err(StoreError::EmptyId);
            }
        }
        let id = job
            .id
            .unwrap_or_else(|| UuidIdGen.next());
        let run_after = job.run_after.unwrap_or(0);
        let record = Job::new(JobId::new(id.clone()), job.command, job.max_retries, run_after, now);

        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let existing: Option<String> = conn
            .query_row("SELECT id FROM jobs WHERE id = ?1", params![id], |r| r.get(0))
            .optional()?;
        if existing.is_some() {
            return Err(StoreError::DuplicateId(id));
        }
        conn.execute(
            "INSERT INTO jobs (id, command, state, attempts, max_retries, run_after, created_at, updated_at, last_error)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?6, NULL)",
            params![
                record.id.as_str(),
                record.command,
                JobState::Pending.as_str(),
                record.max_retries.map(|v| v as i64),
                record.run_after,
                now,
            ],
        )?;
        drop(conn);
        self.mark_dirty();
        Ok(record)
    }

    /// Atomically claim the oldest eligible pending job (§4.1 `claim_next`,
    /// §4.4 step 3). Ties in `created_at` are broken by id, ascending.
    pub fn claim_next(&self, now: i64) -> Result<Option<Job>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let tx = conn.unchecked_transaction()?;
        let candidate: Option<String> = tx
            .query_row(
                "SELECT id FROM jobs
                 WHERE state = ?1 AND run_after <= ?2
                 ORDER BY created_at ASC, id ASC
                 LIMIT 1",
                params![JobState::Pending.as_str(), now],
                |r| r.get(0),
            )
            .optional()?;

        let Some(id) = candidate else {
            return Ok(None);
        };

        let updated = tx.execute(
            "UPDATE jobs SET state = ?1, updated_at = ?2 WHERE id = ?3 AND state = ?4",
            params![JobState::Processing.as_str(), now, id, JobState::Pending.as_str()],
        )?;
        if updated == 0 {
            // Lost a race (or the row moved between the select and the
            // update); treat this tick as having found nothing.
            tx.commit()?;
            return Ok(None);
        }
        let job = tx.query_row(
            &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
            params![id],
            job_from_row,
        )?;
        tx.commit()?;
        drop(conn);
        self.mark_dirty();
        Ok(Some(job))
    }

    /// Terminal write for a job that completed successfully.
    pub fn complete(&self, id: &JobId, now: i64) -> Result<bool, StoreError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE jobs SET state = ?1, updated_at = ?2 WHERE id = ?3 AND state = ?4",
                params![
                    JobState::Completed.as_str(),
                    now,
                    id.as_str(),
                    JobState::Processing.as_str()
                ],
            )
        })?;
        if changed > 0 {
            self.mark_dirty();
        }
        Ok(changed > 0)
    }

    /// Terminal-or-requeue write for a job that failed (§4.5 decides
    /// `new_state`/`new_run_after`; this just applies them).
    #[allow(clippy::too_many_arguments)]
    pub fn fail(
        &self,
        id: &JobId,
        new_attempts: u32,
        new_state: JobState,
        new_run_after: i64,
        now: i64,
        last_error: Option<&str>,
    ) -> Result<bool, StoreError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE jobs
                 SET state = ?1, attempts = ?2, run_after = ?3, updated_at = ?4, last_error = ?5
                 WHERE id = ?6 AND state = ?7",
                params![
                    new_state.as_str(),
                    new_attempts,
                    new_run_after,
                    now,
                    last_error,
                    id.as_str(),
                    JobState::Processing.as_str()
                ],
            )
        })?;
        if changed > 0 {
            self.mark_dirty();
        }
        Ok(changed > 0)
    }

    /// Crash recovery (§4.1 `reset_processing`, §4.4): conditional on the
    /// row still being `processing`, so a transition that already landed is
    /// never clobbered.
    pub fn reset_processing(&self, id: &JobId, now: i64) -> Result<bool, StoreError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE jobs SET state = ?1, updated_at = ?2 WHERE id = ?3 AND state = ?4",
                params![
                    JobState::Pending.as_str(),
                    now,
                    id.as_str(),
                    JobState::Processing.as_str()
                ],
            )
        })?;
        if changed > 0 {
            self.mark_dirty();
        }
        Ok(changed > 0)
    }

    /// Read-only: jobs newest-first, optionally filtered by state.
    pub fn list(&self, state_filter: Option<JobState>) -> Result<Vec<Job>, StoreError> {
        self.with_conn(|conn| {
            let mut jobs = Vec::new();
            match state_filter {
                Some(state) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {JOB_COLUMNS} FROM jobs WHERE state = ?1 ORDER BY created_at DESC"
                    ))?;
                    let rows = stmt.query_map(params![state.as_str()], job_from_row)?;
                    for row in rows {
                        jobs.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {JOB_COLUMNS} FROM jobs ORDER BY created_at DESC"
                    ))?;
                    let rows = stmt.query_map([], job_from_row)?;
                    for row in rows {
                        jobs.push(row?);
                    }
                }
            }
            Ok(jobs)
        })
    }

    /// Read-only: counts of jobs by state (§6 `Status`).
    pub fn summarize(&self) -> Result<JobSummary, StoreError> {
        self.with_conn(|conn| {
            let mut summary = JobSummary::default();
            let mut stmt = conn.prepare("SELECT state, COUNT(*) FROM jobs GROUP BY state")?;
            let rows = stmt.query_map([], |row| {
                let state: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((state, count as u64))
            })?;
            for row in rows {
                let (state, count) = row?;
                match JobState::from_str(&state) {
                    Ok(JobState::Pending) => summary.pending = count,
                    Ok(JobState::Processing) => summary.processing = count,
                    Ok(JobState::Completed) => summary.completed = count,
                    Ok(JobState::Dead) => summary.dead = count,
                    _ => {}
                }
            }
            Ok(summary)
        })
    }

    /// DLQ: requeue one dead job (§4 DLQ ops). Only affects rows currently
    /// `dead`; returns `false` if `id` isn't one.
    pub fn requeue_dead(&self, id: &JobId, now: i64) -> Result<bool, StoreError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE jobs
                 SET state = ?1, attempts = 0, run_after = 0, updated_at = ?2
                 WHERE id = ?3 AND state = ?4",
                params![
                    JobState::Pending.as_str(),
                    now,
                    id.as_str(),
                    JobState::Dead.as_str()
                ],
            )
        })?;
        if changed > 0 {
            self.mark_dirty();
        }
        Ok(changed > 0)
    }

    /// DLQ: requeue every dead job. Returns the number requeued.
    pub fn requeue_all_dead(&self, now: i64) -> Result<u64, StoreError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE jobs
                 SET state = ?1, attempts = 0, run_after = 0, updated_at = ?2
                 WHERE state = ?3",
                params![JobState::Pending.as_str(), now, JobState::Dead.as_str()],
            )
        })?;
        if changed > 0 {
            self.mark_dirty();
        }
        Ok(changed as u64)
    }

    /// Read-only: every recognized config key with its current value.
    pub fn get_config(&self) -> Result<Vec<(ConfigKey, i64)>, StoreError> {
        self.with_conn(|conn| {
            let mut out = Vec::new();
            let mut stmt = conn.prepare("SELECT key, value FROM config")?;
            let rows = stmt.query_map([], |row| {
                let key: String = row.get(0)?;
                let value: String = row.get(1)?;
                Ok((key, value))
            })?;
            for row in rows {
                let (key, value) = row?;
                if let Ok(key) = ConfigKey::from_str(&key) {
                    if let Ok(value) = value.parse::<i64>() {
                        out.push((key, value));
                    }
                }
            }
            Ok(out)
        })
    }

    pub fn get_config_value(&self, key: ConfigKey) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key.as_str()],
                |row| row.get::<_, String>(0),
            )
        })
        .map(|v| v.parse::<i64>().unwrap_or_else(|_| key.default_value()))
    }

    /// Validate-and-set a config value (§4.1 `set_config`). Rejects unknown
    /// keys and out-of-range values (§3) without touching the row.
    pub fn set_config(&self, key: &str, value: &str) -> Result<(ConfigKey, i64), StoreError> {
        let key = ConfigKey::from_str(key).map_err(StoreError::UnknownConfigKey)?;
        let parsed: i64 = value
            .parse()
            .map_err(|_| StoreError::InvalidConfigValue {
                key: key.as_str().to_string(),
                reason: "not an integer".to_string(),
            })?;
        key.validate(parsed)
            .map_err(|reason| StoreError::InvalidConfigValue {
                key: key.as_str().to_string(),
                reason,
            })?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO config (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key.as_str(), parsed.to_string()],
            )
        })?;
        self.mark_dirty();
        Ok((key, parsed))
    }

    #[cfg(test)]
    pub(crate) fn row_count(&self) -> Result<i64, StoreError> {
        self.with_conn(|conn| conn.query_row("SELECT COUNT(*) FROM jobs", [], |r| r.get(0)))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
