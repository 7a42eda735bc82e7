// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store-level error taxonomy (§7: Store-transient / Store-fatal, plus the
//! caller-facing validation/conflict/not-found categories shared with the
//! rest of the core).

use qc_core::error::{CoreError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a job with id {0:?} already exists")]
    DuplicateId(String),

    #[error("no job with id {0:?} is in the dead state")]
    NotDead(String),

    #[error("job id must not be empty")]
    EmptyId,

    #[error("unknown config key: {0}")]
    UnknownConfigKey(String),

    #[error("invalid config value for {key}: {reason}")]
    InvalidConfigValue { key: String, reason: String },

    #[error("server is shutting down")]
    ShuttingDown,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Classify this error the way the daemon's HTTP layer needs to (§7),
    /// without the storage crate knowing anything about HTTP status codes.
    pub fn as_core_error(&self) -> Option<CoreError> {
        match self {
            StoreError::DuplicateId(id) => Some(CoreError::conflict(format!(
                "job {id:?} already exists"
            ))),
            StoreError::NotDead(id) => {
                Some(CoreError::not_found(format!("no dead job with id {id:?}")))
            }
            StoreError::EmptyId => Some(CoreError::validation("job id must not be empty")),
            StoreError::UnknownConfigKey(key) => {
                Some(CoreError::validation(format!("unknown config key: {key}")))
            }
            StoreError::InvalidConfigValue { key, reason } => Some(CoreError::validation(
                format!("invalid value for {key}: {reason}"),
            )),
            StoreError::ShuttingDown => {
                Some(CoreError::guarded_refused("server is shutting down"))
            }
            StoreError::Sqlite(_) | StoreError::Io(_) => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.as_core_error().map(|e| e.kind)
    }
}
