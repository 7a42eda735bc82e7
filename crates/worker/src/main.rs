// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `queuectl-worker`: the Worker Child (C2) executable. Speaks the §4.2
//! protocol over its own stdin/stdout; logs go to stderr only, since stdout
//! is reserved for the framed protocol the parent reads.

use qc_worker::{execute, parse_job_line, render_reply, WorkerReply};
use std::io::{self, BufRead, Write};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_reply(&mut out, &WorkerReply::Ready);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::error!(error = %err, "failed to read job from stdin, exiting");
                break;
            }
        };

        let job = match parse_job_line(&line) {
            Ok(Some(job)) => job,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(error = %err, raw = %line, "received unparseable job message");
                continue;
            }
        };

        tracing::info!(job_id = %job.id, "executing job");
        let reply = execute(&job);
        write_reply(&mut out, &reply);
    }
}

fn write_reply(out: &mut impl Write, reply: &WorkerReply) {
    let line = render_reply(reply);
    if let Err(err) = out.write_all(line.as_bytes()).and_then(|_| out.flush()) {
        tracing::error!(error = %err, "failed to write reply to stdout");
    }
}
