//! Behavioral specifications for queuectl.
//!
//! Black-box: spawn `queuectld`, drive it via the `queuectl` binary, and
//! assert on its observable behavior.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/cli_help.rs"]
mod cli_help;
#[path = "specs/config.rs"]
mod config;
#[path = "specs/crash_recovery.rs"]
mod crash_recovery;
#[path = "specs/dlq.rs"]
mod dlq;
#[path = "specs/happy_path.rs"]
mod happy_path;
#[path = "specs/retry_exhaustion.rs"]
mod retry_exhaustion;
#[path = "specs/shutdown_drain.rs"]
mod shutdown_drain;
#[path = "specs/validation.rs"]
mod validation;
#[path = "specs/worker_pool_concurrency.rs"]
mod worker_pool_concurrency;
