// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The parent<->worker-child wire protocol (§4.2, §6 "process model"):
//! newline-delimited JSON records over the child's stdin/stdout.

use serde::{Deserialize, Serialize};

/// A job handed to the worker on stdin. Only `id` and `command` are used;
/// the struct is deliberately permissive (`#[serde(deny_unknown_fields)]` is
/// NOT set) so the parent can send additional fields in the future without
/// breaking old workers.
#[derive(Debug, Clone, Deserialize)]
pub struct JobAssignment {
    pub id: String,
    pub command: String,
}

/// One terminal (or the initial readiness) reply from the worker, written
/// on stdout as a single JSON line per §4.2.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerReply {
    Ready,
    Completed { job: String, output: String },
    Failed { job: String, error: String },
}

/// Read one [`JobAssignment`] from a line of input. Returns `Ok(None)` on
/// EOF/blank input so the caller's read loop can exit cleanly.
pub fn parse_job_line(line: &str) -> Result<Option<JobAssignment>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}

/// Render a reply as a single newline-terminated JSON line.
pub fn render_reply(reply: &WorkerReply) -> String {
    let mut line = serde_json::to_string(reply).unwrap_or_else(|_| {
        r#"{"status":"failed","job":"","error":"failed to serialize reply"}"#.to_string()
    });
    line.push('\n');
    line
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
