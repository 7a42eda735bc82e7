// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker Pool (C3, §4.3): spawns and tracks worker children, keeps the
//! idle queue and the worker<->job binding map, and feeds terminal replies
//! and exit notifications back to the caller as [`WorkerEvent`]s.
//!
//! Every worker is in exactly one of {spawning, idle, busy, dying} (§4.3).
//! `spawning` workers exist only as an entry in `handles`, not yet in
//! `idle`; `dying` workers are ones whose exit has been observed but whose
//! replacement hasn't been decided yet by the caller.

use qc_core::JobId;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::error::EngineError;

/// Identity of a live worker process. Stable for the process's lifetime;
/// reused ids are never issued (the pool counts monotonically).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(pub u32);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Something the pool observed about one of its workers.
#[derive(Debug)]
pub enum WorkerEvent {
    Ready(WorkerId),
    Completed {
        worker: WorkerId,
        job: JobId,
        output: String,
    },
    Failed {
        worker: WorkerId,
        job: JobId,
        error: String,
    },
    /// The child process exited, for any reason. If it was bound to a job,
    /// the caller must treat that job as crashed (§4.4 crash recovery).
    Exited(WorkerId),
}

#[derive(Serialize)]
struct WireJob<'a> {
    id: &'a str,
    command: &'a str,
}

struct WorkerHandle {
    stdin_tx: mpsc::UnboundedSender<String>,
    #[allow(dead_code)]
    child: Child,
}

/// Live worker set plus idle queue and bindings (§4.3).
pub struct Pool {
    worker_bin: PathBuf,
    next_id: u32,
    handles: HashMap<WorkerId, WorkerHandle>,
    idle: VecDeque<WorkerId>,
    bindings: HashMap<WorkerId, JobId>,
    events_tx: mpsc::UnboundedSender<WorkerEvent>,
}

impl Pool {
    /// Create an empty pool. `worker_bin` is the path to the
    /// `queuectl-worker` executable; no children are spawned yet.
    pub fn new(worker_bin: PathBuf) -> (Self, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                worker_bin,
                next_id: 0,
                handles: HashMap::new(),
                idle: VecDeque::new(),
                bindings: HashMap::new(),
                events_tx,
            },
            events_rx,
        )
    }

    /// Spawn `count` workers (§4.3 `init`).
    pub fn init(&mut self, count: usize) -> Result<(), EngineError> {
        for _ in 0..count {
            self.spawn_one()?;
        }
        Ok(())
    }

    /// Start one child. It is not placed in the idle queue until it sends
    /// `{"status":"ready"}` (§4.3 `spawn_one`).
    pub fn spawn_one(&mut self) -> Result<WorkerId, EngineError> {
        let id = WorkerId(self.next_id);
        self.next_id += 1;

        let mut child = Command::new(&self.worker_bin)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(EngineError::Spawn(std::io::Error::other(
                "worker child did not expose piped stdin/stdout",
            )));
        };

        let (stdin_tx, mut stdin_rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(line) = stdin_rx.recv().await {
                if stdin.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
            }
        });

        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(event) = parse_worker_line(id, &line) {
                            if events_tx.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        let _ = events_tx.send(WorkerEvent::Exited(id));
                        break;
                    }
                    Err(err) => {
                        tracing::warn!(worker = %id, error = %err, "error reading worker stdout");
                        let _ = events_tx.send(WorkerEvent::Exited(id));
                        break;
                    }
                }
            }
        });

        self.handles.insert(id, WorkerHandle { stdin_tx, child });
        Ok(id)
    }

    /// Pop one idle worker and hand it `job` (§4.4 step 5). Returns `None`
    /// if the idle queue is empty.
    pub fn dispatch(&mut self, job_id: &JobId, command: &str) -> Option<WorkerId> {
        let worker = self.idle.pop_front()?;
        let Some(handle) = self.handles.get(&worker) else {
            // Stale idle entry for a worker that already exited; drop it
            // and let the caller retry on the next tick.
            return None;
        };
        let wire = WireJob {
            id: job_id.as_str(),
            command,
        };
        let mut line = serde_json::to_string(&wire).unwrap_or_default();
        line.push('\n');
        if handle.stdin_tx.send(line).is_err() {
            return None;
        }
        self.bindings.insert(worker, job_id.clone());
        Some(worker)
    }

    /// A worker reported readiness: place it in the idle queue.
    pub fn on_ready(&mut self, worker: WorkerId) {
        if self.handles.contains_key(&worker) && !self.idle.contains(&worker) {
            self.idle.push_back(worker);
        }
    }

    /// A worker reported a terminal result: clear its binding and return it
    /// to idle. Returns the job id it was bound to, if any.
    pub fn on_terminal(&mut self, worker: WorkerId) -> Option<JobId> {
        let job = self.bindings.remove(&worker);
        if self.handles.contains_key(&worker) {
            self.idle.push_back(worker);
        }
        job
    }

    /// A worker process exited. Clears its binding and removes it from the
    /// idle queue and the handle table; spawns a replacement unless
    /// `shutting_down`. Returns the job it was bound to, if any (the caller
    /// must reset that job to `pending`, §4.4 crash recovery).
    pub fn on_exit(&mut self, worker: WorkerId, shutting_down: bool) -> Result<Option<JobId>, EngineError> {
        self.idle.retain(|w| *w != worker);
        let job = self.bindings.remove(&worker);
        self.handles.remove(&worker);
        if !shutting_down {
            self.spawn_one()?;
        }
        Ok(job)
    }

    pub fn processing_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    pub fn live_count(&self) -> usize {
        self.handles.len()
    }

    /// §4.3: `live = processing + idle`. Deliberately not `live_count()`
    /// (total spawned handles) — a worker that has been spawned but hasn't
    /// yet reported `ready` is in neither bucket, and should not appear
    /// "live" to callers of `/status`.
    pub fn stats(&self) -> qc_core::WorkerSummary {
        let processing = self.processing_count();
        let idle = self.idle_count();
        qc_core::WorkerSummary {
            processing,
            idle,
            live: processing + idle,
        }
    }
}

fn parse_worker_line(worker: WorkerId, line: &str) -> Option<WorkerEvent> {
    let value: serde_json::Value = serde_json::from_str(line.trim()).ok()?;
    match value.get("status").and_then(|v| v.as_str())? {
        "ready" => Some(WorkerEvent::Ready(worker)),
        "completed" => Some(WorkerEvent::Completed {
            worker,
            job: JobId::new(value.get("job")?.as_str()?),
            output: value.get("output").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        }),
        "failed" => Some(WorkerEvent::Failed {
            worker,
            job: JobId::new(value.get("job")?.as_str()?),
            error: value.get("error").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        }),
        other => {
            tracing::warn!(worker = %worker, status = other, "unrecognized worker status");
            None
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
