// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `jobs` and `config` tables (§3), and the row <-> [`Job`] mapping.

use qc_core::{ConfigKey, Job, JobId, JobState};
use rusqlite::{Connection, Row};
use std::str::FromStr;

pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id          TEXT PRIMARY KEY,
    command     TEXT NOT NULL,
    state       TEXT NOT NULL,
    attempts    INTEGER NOT NULL,
    max_retries INTEGER,
    run_after   INTEGER NOT NULL,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    last_error  TEXT
);

CREATE INDEX IF NOT EXISTS idx_jobs_state_run_after ON jobs (state, run_after);

CREATE TABLE IF NOT EXISTS config (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Create the schema and seed default config rows if the database is fresh.
pub fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(DDL)?;
    for key in ConfigKey::ALL {
        conn.execute(
            "INSERT OR IGNORE INTO config (key, value) VALUES (?1, ?2)",
            rusqlite::params![key.as_str(), key.default_value().to_string()],
        )?;
    }
    Ok(())
}

pub fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    let id: String = row.get("id")?;
    let state: String = row.get("state")?;
    Ok(Job {
        id: JobId::new(id),
        command: row.get("command")?,
        state: JobState::from_str(&state).unwrap_or(JobState::Pending),
        attempts: row.get::<_, i64>("attempts")? as u32,
        max_retries: row
            .get::<_, Option<i64>>("max_retries")?
            .map(|v| v as u32),
        run_after: row.get("run_after")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        last_error: row.get("last_error")?,
    })
}

pub const JOB_COLUMNS: &str =
    "id, command, state, attempts, max_retries, run_after, created_at, updated_at, last_error";
