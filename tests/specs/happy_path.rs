use std::time::Duration;

use crate::prelude::TestDaemon;

/// §8 scenario 1: a job whose command succeeds reaches `completed` with no
/// retries, within roughly 500ms at the scenario's tick interval.
#[test]
fn succeeding_job_completes_with_zero_attempts() {
    let daemon = TestDaemon::start();

    daemon
        .cli()
        .args(&["enqueue", "echo success"])
        .passes()
        .stdout_has("enqueued job");

    let jobs = crate::prelude::poll_until(Duration::from_millis(800), || {
        let out = daemon.cli().args(&["list", "--state", "completed"]).passes();
        let stdout = out.stdout();
        if stdout.contains("echo success") {
            Some(stdout)
        } else {
            None
        }
    });

    assert!(jobs.contains("echo success"));
    assert!(jobs.contains("completed"));
    // attempts column is right after STATE; a passing job never retries.
    let data_line = jobs
        .lines()
        .find(|l| l.contains("echo success"))
        .expect("job row present");
    let attempts: &str = data_line.split_whitespace().nth(2).unwrap_or("");
    assert_eq!(attempts, "0");
}
