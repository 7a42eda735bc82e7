use std::process::Command;

use crate::prelude::queuectl_path;

/// `queuectl --help` works without a daemon running at all.
#[test]
fn help_flag_describes_the_cli_without_a_daemon() {
    let output = Command::new(queuectl_path())
        .arg("--help")
        .output()
        .expect("queuectl --help should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("queuectl"));
    assert!(stdout.contains("enqueue"));
}

#[test]
fn version_flag_reports_a_version() {
    let output = Command::new(queuectl_path())
        .arg("--version")
        .output()
        .expect("queuectl --version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("queuectl"));
}
