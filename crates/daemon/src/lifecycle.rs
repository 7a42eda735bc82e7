// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle Controller (C6, §4.6): owns the single `running -> shutting_down
//! -> exiting` transition, however it was triggered (operator signal or the
//! `Shutdown` control operation), and hands back one future both triggers can
//! wait on.

use std::sync::Arc;

use qc_engine::Core;
use tokio::sync::watch;

/// Shared between the signal-handling task, the `Shutdown` HTTP handler, and
/// `main`'s graceful-shutdown future. A `watch` channel (not a `Notify`)
/// because more than one task needs to observe the same one-shot trigger,
/// including tasks that start watching after it may already have fired.
pub struct Lifecycle {
    tx: watch::Sender<bool>,
}

impl Lifecycle {
    pub fn new() -> (Arc<Self>, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Arc::new(Self { tx }), rx)
    }

    /// §4.6 step 1: flip the core's guard (future enqueue/DLQ/config-set
    /// calls are refused) and wake every shutdown waiter. Idempotent.
    pub fn initiate(&self, core: &Core) {
        core.begin_shutdown();
        let _ = self.tx.send(true);
    }
}

/// Resolves once [`Lifecycle::initiate`] has been called; intended as the
/// future passed to `axum::serve(..).with_graceful_shutdown(..)`.
pub async fn wait_for_trigger(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|triggered| *triggered).await;
}
