// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! qc-storage: the Job Store (C1) — an in-process SQLite database wrapped
//! with the snapshot/dirty-flag durability protocol of §4.1.

mod error;
mod schema;
mod snapshot;
mod store;

pub use error::StoreError;
pub use snapshot::{SNAPSHOT_BAK, SNAPSHOT_FILE, SNAPSHOT_TMP};
pub use store::Store;
