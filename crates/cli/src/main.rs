// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! queuectl: the operator CLI for the Control API (§6).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod color;
mod daemon_process;
mod env;
mod table;

use clap::{Parser, Subcommand};
use client::{ClientError, DaemonClient};
use qc_core::NewJob;
use table::{Column, Table};

#[derive(Parser)]
#[command(name = "queuectl", version, about = "Operate a queuectl job queue", styles = color::styles())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enqueue a new job
    Enqueue {
        /// Shell command to run
        command: String,
        /// Override the default max-retries for this job
        #[arg(long)]
        max_retries: Option<u32>,
        /// Delay eligibility by this many seconds from now
        #[arg(long)]
        run_after: Option<i64>,
    },
    /// List jobs, optionally filtered by state
    List {
        /// One of: pending, processing, completed, dead
        #[arg(long)]
        state: Option<String>,
    },
    /// Show queue and worker pool status
    Status,
    /// Dead-letter queue operations
    #[command(subcommand)]
    Dlq(DlqCommand),
    /// Runtime configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Request a graceful shutdown of the daemon
    Shutdown,
}

#[derive(Subcommand)]
enum DlqCommand {
    /// List dead jobs
    List,
    /// Requeue a single dead job
    Retry { id: String },
    /// Requeue every dead job
    RetryAll,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// List every configuration key
    List,
    /// Read one configuration key
    Get { key: String },
    /// Set one configuration key
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli.command).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(command: Command) -> Result<(), ClientError> {
    match command {
        Command::Enqueue {
            command,
            max_retries,
            run_after,
        } => {
            let client = DaemonClient::for_action().await?;
            // `--run-after` is a delay in seconds from now; the wire/store
            // contract (§3) is an absolute epoch-millisecond eligibility
            // time, so convert here rather than forward the raw seconds.
            let run_after = run_after.map(|secs| {
                use qc_core::Clock as _;
                qc_core::SystemClock.now_ms().saturating_add(secs.saturating_mul(1000))
            });
            let job = client
                .enqueue(NewJob {
                    id: None,
                    command,
                    max_retries,
                    run_after,
                })
                .await?;
            println!("enqueued job {}", job.id);
        }
        Command::List { state } => {
            let client = DaemonClient::for_query().await?;
            let jobs = client.list(state.as_deref()).await?;
            print_jobs(&jobs);
        }
        Command::Status => {
            let client = DaemonClient::for_query().await?;
            let (jobs, workers) = client.status().await?;
            println!(
                "jobs:    pending={} processing={} completed={} dead={}",
                jobs.pending, jobs.processing, jobs.completed, jobs.dead
            );
            println!(
                "workers: processing={} idle={} live={}",
                workers.processing, workers.idle, workers.live
            );
        }
        Command::Dlq(DlqCommand::List) => {
            let client = DaemonClient::for_query().await?;
            let jobs = client.dlq_list().await?;
            print_jobs(&jobs);
        }
        Command::Dlq(DlqCommand::Retry { id }) => {
            let client = DaemonClient::for_action().await?;
            println!("{}", client.dlq_retry_one(&id).await?);
        }
        Command::Dlq(DlqCommand::RetryAll) => {
            let client = DaemonClient::for_action().await?;
            let (message, _count) = client.dlq_retry_all().await?;
            println!("{message}");
        }
        Command::Config(ConfigCommand::List) => {
            let client = DaemonClient::for_query().await?;
            let entries = client.config_list().await?;
            print_config(&entries);
        }
        Command::Config(ConfigCommand::Get { key }) => {
            let client = DaemonClient::for_query().await?;
            let entry = client.config_get(&key).await?;
            print_config(&entry);
        }
        Command::Config(ConfigCommand::Set { key, value }) => {
            let client = DaemonClient::for_action().await?;
            let entry = client.config_set(&key, &value).await?;
            print_config(&entry);
        }
        Command::Shutdown => {
            let client = DaemonClient::for_query().await?;
            client.shutdown().await?;
            println!("shutdown requested");
        }
    }
    Ok(())
}

fn print_jobs(jobs: &[qc_core::Job]) {
    use qc_core::{Clock, SystemClock};
    let now = SystemClock.now_ms();
    let mut table = Table::new(vec![
        Column::left("ID"),
        Column::status("STATE"),
        Column::right("ATTEMPTS"),
        Column::muted("AGE"),
        Column::left("COMMAND").with_max(60),
    ]);
    for job in jobs {
        let age_ms = now.saturating_sub(job.updated_at).max(0) as u64;
        table.row(vec![
            job.id.as_str().to_string(),
            job.state.as_str().to_string(),
            job.attempts.to_string(),
            qc_core::format_elapsed_ms(age_ms),
            job.command.clone(),
        ]);
    }
    let mut out = std::io::stdout();
    table.render(&mut out);
}

fn print_config(value: &serde_json::Value) {
    let Some(map) = value.as_object() else {
        println!("{value}");
        return;
    };
    let mut table = Table::new(vec![Column::left("KEY"), Column::left("VALUE")]);
    for (key, val) in map {
        table.row(vec![key.clone(), val.to_string()]);
    }
    let mut out = std::io::stdout();
    table.render(&mut out);
}
