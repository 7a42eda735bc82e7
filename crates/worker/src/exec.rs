// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executes one job's shell command and turns the result into a
//! [`WorkerReply`] (§4.2 steps 1-5).

use std::process::Command;

use crate::protocol::{JobAssignment, WorkerReply};

/// Run `job.command` through the system shell and classify the outcome.
///
/// Step 1 (§4.2) tokenizes the command with [`qc_shell`] before ever
/// spawning anything, so a command that can't be safely split into shell
/// words never reaches `sh -c`.
pub fn execute(job: &JobAssignment) -> WorkerReply {
    if let Err(err) = qc_shell::validate(&job.command) {
        return WorkerReply::Failed {
            job: job.id.clone(),
            error: format!("Unparseable command: {err}"),
        };
    }

    match Command::new("sh").arg("-c").arg(&job.command).output() {
        Ok(output) => {
            if output.status.success() {
                WorkerReply::Completed {
                    job: job.id.clone(),
                    output: String::from_utf8_lossy(&output.stdout).into_owned(),
                }
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let error = if stderr.is_empty() {
                    format!(
                        "Process exited with code {}",
                        output.status.code().unwrap_or(-1)
                    )
                } else {
                    stderr
                };
                WorkerReply::Failed {
                    job: job.id.clone(),
                    error,
                }
            }
        }
        Err(err) => WorkerReply::Failed {
            job: job.id.clone(),
            error: format!("failed to spawn command: {err}"),
        },
    }
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
