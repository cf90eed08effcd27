//! Command execution specs
//!
//! Verify the command runs under the lock and its outcome is reported.

use crate::prelude::*;

#[test]
fn command_output_passes_through() {
    Project::empty()
        .tenure()
        .args(&["--memory", "run", "jobs", "--", "echo", "hello"])
        .passes()
        .stdout_eq("hello\n");
}

#[test]
fn command_exit_code_is_reported() {
    Project::empty()
        .tenure()
        .args(&["--memory", "run", "jobs", "--", "sh", "-c", "exit 3"])
        .exits(3);
}

#[test]
fn command_sees_lock_key() {
    Project::empty()
        .tenure()
        .args(&[
            "--memory",
            "run",
            "deploy/prod",
            "--",
            "sh",
            "-c",
            "echo $TENURE_LOCK_KEY",
        ])
        .passes()
        .stdout_eq("deploy/prod\n");
}

#[test]
fn command_runs_in_working_directory() {
    let project = Project::empty();
    project.file("marker.txt", "here");

    project
        .tenure()
        .args(&["--memory", "run", "jobs", "--", "cat", "marker.txt"])
        .passes()
        .stdout_eq("here");
}

#[test]
fn lease_outlives_renewals() {
    // Renewal every ~330ms keeps a 1s lease alive through a 2s command
    Project::empty()
        .tenure()
        .args(&[
            "--memory", "run", "jobs", "--lease", "1s", "--", "sh", "-c", "sleep 2; echo done",
        ])
        .passes()
        .stdout_eq("done\n");
}

#[test]
fn verbose_logs_lock_lifecycle() {
    Project::empty()
        .tenure()
        .args(&["--memory", "-v", "run", "jobs", "--", "true"])
        .passes()
        .stderr_has("lock acquired")
        .stderr_has("lock released");
}

#[test]
fn quiet_by_default() {
    Project::empty()
        .tenure()
        .args(&["--memory", "run", "jobs", "--", "true"])
        .passes()
        .stderr_lacks("lock acquired");
}
