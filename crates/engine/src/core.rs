// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Core` actor: owns the Job Store (C1) and Worker Pool (C3) behind a
//! single mutex per §5 ("there is no benefit to finer-grained locking at
//! this scale"), and implements the Scheduler tick (C4) and Retry/Backoff
//! policy (C5) on top of them.
//!
//! This is the "single-threaded cooperative core" of §5: every method here
//! that touches the store or the pool takes the same lock, so two ticks,
//! an enqueue, and a worker-event handler can never interleave their
//! effects on shared state. Worker execution itself still happens in
//! parallel OS processes; only the bookkeeping is serialized.

use qc_core::{Clock, ConfigKey, EngineConfig, Job, JobId, JobState, JobSummary, NewJob, SystemClock, WorkerSummary};
use qc_storage::{StoreError, Store};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

use crate::error::EngineError;
use crate::pool::{Pool, WorkerEvent, WorkerId};
use crate::retry;

pub struct Core {
    store: Arc<Store>,
    pool: parking_lot::Mutex<Pool>,
    shutting_down: AtomicBool,
    tick_in_flight: AtomicBool,
    /// Woken once per applied worker event so [`Core::wait_for_quiescence`]
    /// never has to poll (§4.6 step 5, §9 "notify exactly once when
    /// processing_count first becomes zero after shutdown begins").
    quiescence: Notify,
}

/// Constructed alongside a [`Core`]; the daemon drives this loop to apply
/// worker replies to the store (§4.3 "hand the result to C5").
pub struct EventLoop {
    core: Arc<Core>,
    events: mpsc::UnboundedReceiver<WorkerEvent>,
}

impl Core {
    /// Build a `Core` over an already-loaded [`Store`] and a fresh, empty
    /// pool (no workers spawned yet — call [`Core::init_pool`]).
    pub fn new(store: Arc<Store>, worker_bin: PathBuf) -> (Arc<Self>, EventLoop) {
        let (pool, events) = Pool::new(worker_bin);
        let core = Arc::new(Self {
            store,
            pool: parking_lot::Mutex::new(pool),
            shutting_down: AtomicBool::new(false),
            tick_in_flight: AtomicBool::new(false),
            quiescence: Notify::new(),
        });
        let event_loop = EventLoop {
            core: core.clone(),
            events,
        };
        (core, event_loop)
    }

    pub fn init_pool(&self, count: usize) -> Result<(), EngineError> {
        self.pool.lock().init(count)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Step 1 of shutdown (§4.6): future writes are refused from here on.
    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn processing_count(&self) -> usize {
        self.pool.lock().processing_count()
    }

    /// §4.6 steps 4-5: block until the pool's `processing` count first
    /// reaches zero. Intended to be called only after [`Core::begin_shutdown`]
    /// so new work can't refill the count while this waits.
    pub async fn wait_for_quiescence(&self) {
        loop {
            // Register interest before checking the count: otherwise a
            // notification fired between the check and the await would be
            // missed and this would wait forever.
            let notified = self.quiescence.notified();
            if self.processing_count() == 0 {
                return;
            }
            notified.await;
        }
    }

    pub fn enqueue(&self, job: NewJob, now: i64) -> Result<Job, StoreError> {
        if self.is_shutting_down() {
            return Err(StoreError::ShuttingDown);
        }
        self.store.enqueue(job, now)
    }

    pub fn list(&self, state_filter: Option<JobState>) -> Result<Vec<Job>, StoreError> {
        self.store.list(state_filter)
    }

    pub fn status(&self) -> Result<(JobSummary, WorkerSummary), StoreError> {
        let jobs = self.store.summarize()?;
        let workers = self.pool.lock().stats();
        Ok((jobs, workers))
    }

    pub fn dlq_list(&self) -> Result<Vec<Job>, StoreError> {
        self.store.list(Some(JobState::Dead))
    }

    pub fn dlq_retry_one(&self, id: &JobId, now: i64) -> Result<bool, StoreError> {
        if self.is_shutting_down() {
            return Err(StoreError::ShuttingDown);
        }
        self.store.requeue_dead(id, now)
    }

    pub fn dlq_retry_all(&self, now: i64) -> Result<u64, StoreError> {
        if self.is_shutting_down() {
            return Err(StoreError::ShuttingDown);
        }
        self.store.requeue_all_dead(now)
    }

    pub fn get_config(&self) -> Result<Vec<(ConfigKey, i64)>, StoreError> {
        self.store.get_config()
    }

    pub fn get_config_one(&self, key: ConfigKey) -> Result<i64, StoreError> {
        self.store.get_config_value(key)
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<(ConfigKey, i64), StoreError> {
        if self.is_shutting_down() {
            return Err(StoreError::ShuttingDown);
        }
        self.store.set_config(key, value)
    }

    pub fn engine_config(&self) -> Result<EngineConfig, StoreError> {
        Ok(EngineConfig {
            max_retries: self.get_config_one(ConfigKey::MaxRetries)? as u32,
            backoff_base: self.get_config_one(ConfigKey::BackoffBase)? as u32,
            backoff_factor_ms: self.get_config_one(ConfigKey::BackoffFactorMs)?,
            tick_interval_ms: self.get_config_one(ConfigKey::TickIntervalMs)? as u64,
            save_interval_ms: self.get_config_one(ConfigKey::SaveIntervalMs)? as u64,
        })
    }

    /// One scheduler tick (§4.4): at most one dispatch, guarded against
    /// shutdown, re-entrance, and an empty idle queue.
    pub fn tick(&self, now: i64) -> Result<(), EngineError> {
        if self.is_shutting_down() {
            return Ok(());
        }
        if self
            .tick_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }
        let result = self.tick_inner(now);
        self.tick_in_flight.store(false, Ordering::SeqCst);
        result
    }

    fn tick_inner(&self, now: i64) -> Result<(), EngineError> {
        let mut pool = self.pool.lock();
        if pool.idle_count() == 0 {
            return Ok(());
        }
        let Some(job) = self.store.claim_next(now)? else {
            return Ok(());
        };
        if pool.dispatch(&job.id, &job.command).is_none() {
            // Lost the idle worker between the check and the dispatch (or
            // its stdin channel closed); undo the claim so the job is
            // retried on the next tick instead of being stuck.
            self.store.reset_processing(&job.id, now)?;
        }
        Ok(())
    }

    /// Apply one worker event to the store (§4.1 `complete`/`fail`,
    /// §4.4 crash recovery) and update pool bookkeeping to match.
    pub fn handle_event(&self, event: WorkerEvent, now: i64) -> Result<(), EngineError> {
        match event {
            WorkerEvent::Ready(worker) => {
                self.pool.lock().on_ready(worker);
            }
            WorkerEvent::Completed { worker, job, .. } => {
                self.pool.lock().on_terminal(worker);
                self.store.complete(&job, now)?;
            }
            WorkerEvent::Failed { worker, job, error } => {
                self.pool.lock().on_terminal(worker);
                self.apply_failure(&job, &error, now)?;
            }
            WorkerEvent::Exited(worker) => {
                let shutting_down = self.is_shutting_down();
                let job = self.pool.lock().on_exit(worker, shutting_down)?;
                if let Some(job_id) = job {
                    // §4.4: crash recovery does not increment attempts.
                    self.store.reset_processing(&job_id, now)?;
                }
            }
        }
        // Any event that can change `processing_count` (a terminal reply or
        // an exit) is a candidate for quiescence; cheap to notify always.
        self.quiescence.notify_waiters();
        Ok(())
    }

    fn apply_failure(&self, job_id: &JobId, error: &str, now: i64) -> Result<(), EngineError> {
        let job = self
            .store
            .list(None)?
            .into_iter()
            .find(|j| &j.id == job_id);
        let Some(job) = job else {
            return Ok(());
        };
        let config = self.engine_config()?;
        let decision = retry::decide(
            job.attempts,
            job.max_retries,
            config.max_retries,
            config.backoff_base,
            config.backoff_factor_ms,
            now,
        );
        self.store.fail(
            job_id,
            decision.new_attempts,
            decision.new_state,
            decision.new_run_after,
            now,
            Some(error),
        )?;
        Ok(())
    }

    pub fn snapshot_to(&self, state_dir: &std::path::Path) -> Result<(), StoreError> {
        self.store.snapshot_to(state_dir)
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn worker_stats(&self) -> WorkerSummary {
        self.pool.lock().stats()
    }
}

impl EventLoop {
    /// Drain worker events forever, applying each to the core. Intended to
    /// run as its own background task for the daemon's lifetime.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            let now = SystemClock.now_ms();
            if let Err(err) = self.core.handle_event(event, now) {
                tracing::error!(error = %err, "failed to apply worker event");
            }
        }
    }
}

#[cfg(test)]
#[path = "core_tests.rs"]
mod tests;
