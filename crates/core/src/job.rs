// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job record: the unit of work tracked by the store, scheduled by the
//! engine, and executed by a worker child.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Stable text identifier for a job, client-supplied or server-generated.
    pub struct JobId;
}

/// Lifecycle state of a job.
///
/// `Failed` is reserved: no store transition produces it. The live state
/// machine only ever assigns `Pending`, `Processing`, `Completed`, and
/// `Dead`. It is modeled here so the wire/query layer can filter on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
    Dead,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Dead => "dead",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobState::Pending),
            "processing" => Ok(JobState::Processing),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            "dead" => Ok(JobState::Dead),
            other => Err(format!("unknown job state: {other}")),
        }
    }
}

/// A job record as persisted in the store and returned over the control API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub command: String,
    pub state: JobState,
    pub attempts: u32,
    pub max_retries: Option<u32>,
    pub run_after: i64,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Parameters accepted by an enqueue request; distinct from [`Job`] because
/// the caller only supplies a subset of fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewJob {
    pub id: Option<String>,
    pub command: String,
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub run_after: Option<i64>,
}

impl Job {
    /// Construct a freshly enqueued job at `now`.
    pub fn new(id: JobId, command: String, max_retries: Option<u32>, run_after: i64, now: i64) -> Self {
        Self {
            id,
            command,
            state: JobState::Pending,
            attempts: 0,
            max_retries,
            run_after,
            created_at: now,
            updated_at: now,
            last_error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Completed | JobState::Dead)
    }

    pub fn is_eligible(&self, now: i64) -> bool {
        self.state == JobState::Pending && self.run_after <= now
    }
}

/// Counts of jobs by state, returned by the `Status` control operation (§6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub dead: u64,
}

/// Counts of live workers, returned alongside [`JobSummary`] by `Status` (§6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub processing: usize,
    pub idle: usize,
    pub live: usize,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
