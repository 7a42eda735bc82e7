// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine: the Worker Pool (C3), Scheduler (C4), and
//! Retry/Backoff policy (C5).

use qc_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("no idle worker is bound to job {0:?}")]
    UnknownBinding(String),
}
