//! CLI error specs

use crate::prelude::*;

#[test]
fn unknown_subcommand_is_usage_error() {
    Project::empty()
        .tenure()
        .args(&["frobnicate"])
        .exits(2)
        .stderr_has("frobnicate");
}

#[test]
fn run_without_command_is_usage_error() {
    Project::empty()
        .tenure()
        .args(&["--memory", "run", "jobs"])
        .exits(2);
}

#[test]
fn memory_and_redis_url_conflict() {
    Project::empty()
        .tenure()
        .args(&["--memory", "--redis-url", "redis://x", "run", "jobs", "--", "true"])
        .exits(2);
}

#[test]
fn zero_lease_is_rejected() {
    Project::empty()
        .tenure()
        .args(&["--memory", "run", "jobs", "--lease", "0s", "--", "true"])
        .fails()
        .stderr_has("lease must be greater than zero");
}

#[test]
fn bad_duration_is_usage_error() {
    Project::empty()
        .tenure()
        .args(&["--memory", "run", "jobs", "--lease", "soon", "--", "true"])
        .exits(2);
}

#[test]
fn missing_program_reports_not_runnable() {
    Project::empty()
        .tenure()
        .args(&["--memory", "run", "jobs", "--", "tenure-no-such-program"])
        .exits(127)
        .stderr_has("Failed to start 'tenure-no-such-program'");
}
