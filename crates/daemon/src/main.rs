// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! queuectld: the background process that owns the job store, the worker
//! pool, and the Control API. Started directly or auto-started by `queuectl`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;
use std::time::Duration;

use qc_core::{Clock, SystemClock};
use qc_daemon::{build_router, env, lock, AppState, Lifecycle};
use qc_engine::Core;
use qc_storage::Store;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("queuectld {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: queuectld [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let state_dir = env::resolve_state_dir(None);
    std::fs::create_dir_all(&state_dir)?;

    let _instance_lock = match lock::acquire(&state_dir) {
        Ok(lock) => lock,
        Err(err) => {
            eprintln!("queuectld: {err}");
            std::process::exit(1);
        }
    };

    let bind_addr = env::resolve_bind_addr(None)?;
    let worker_count = env::resolve_worker_count(None);
    let worker_bin = env::resolve_worker_bin();

    let store = Arc::new(Store::load_or_init(&state_dir)?);
    info!(state_dir = %state_dir.display(), "loaded job store");

    let (core, event_loop) = Core::new(store, worker_bin);
    core.init_pool(worker_count)?;
    info!(workers = worker_count, "worker pool ready");

    tokio::spawn(event_loop.run());

    let (lifecycle, shutdown_rx) = Lifecycle::new();

    spawn_tick_loop(core.clone(), shutdown_rx.clone());
    spawn_snapshot_loop(core.clone(), state_dir.clone(), shutdown_rx.clone());
    spawn_signal_handler(lifecycle.clone(), core.clone())?;

    let app_state = AppState {
        core: core.clone(),
        lifecycle: lifecycle.clone(),
        state_dir: state_dir.clone(),
    };
    let router = build_router(app_state);

    let listener = TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "listening");
    println!("READY");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(qc_daemon::lifecycle::wait_for_trigger(shutdown_rx))
    .await?;

    info!("no longer accepting connections, draining in-flight jobs");
    core.wait_for_quiescence().await;

    core.snapshot_to(&state_dir)?;
    info!("final snapshot written, exiting");
    Ok(())
}

/// Scheduler tick (§4.4): re-entrant-safe, so a fixed interval is sufficient
/// even though a tick can occasionally overlap the previous one's tail.
fn spawn_tick_loop(core: Arc<Core>, mut shutdown_rx: tokio::sync::watch::Receiver<bool>) {
    tokio::spawn(async move {
        let interval_ms = core.engine_config().map(|c| c.tick_interval_ms).unwrap_or(200);
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = SystemClock.now_ms();
                    if let Err(err) = core.tick(now) {
                        error!(error = %err, "scheduler tick failed");
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }
    });
}

/// Periodic snapshot (§4.1): only writes when the store is dirty.
fn spawn_snapshot_loop(
    core: Arc<Core>,
    state_dir: std::path::PathBuf,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let interval_ms = core.engine_config().map(|c| c.save_interval_ms).unwrap_or(5000);
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if core.is_dirty() {
                        if let Err(err) = core.snapshot_to(&state_dir) {
                            error!(error = %err, "periodic snapshot failed");
                        }
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }
    });
}

fn spawn_signal_handler(
    lifecycle: Arc<Lifecycle>,
    core: Arc<Core>,
) -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
        }
        lifecycle.initiate(&core);
    });
    Ok(())
}

fn print_help() {
    println!("queuectld {}", env!("CARGO_PKG_VERSION"));
    println!("Background job queue daemon");
    println!();
    println!("USAGE:");
    println!("    queuectld");
    println!();
    println!("queuectld is typically started by the `queuectl` CLI and should");
    println!("not be invoked directly. It listens on a loopback TCP socket for");
    println!("commands from `queuectl`.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
}
