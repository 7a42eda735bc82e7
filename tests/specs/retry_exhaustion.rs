use std::time::Duration;

use crate::prelude::TestDaemon;

/// §8 scenario 2 + the "retry budget" law: a job that fails every attempt
/// reaches `dead` after exactly `effective_max_retries + 1` attempts (3,
/// given the scenario default `max_retries=2`).
#[test]
fn failing_job_exhausts_retries_into_dead_letter() {
    let daemon = TestDaemon::start();

    daemon.cli().args(&["enqueue", "exit 1"]).passes();

    let row = crate::prelude::poll_until(Duration::from_secs(3), || {
        let out = daemon.cli().args(&["dlq", "list"]).passes();
        let stdout = out.stdout();
        stdout.lines().find(|l| l.contains("exit 1")).map(str::to_string)
    });

    let attempts = row.split_whitespace().nth(2).unwrap_or("");
    assert_eq!(attempts, "3");
}
