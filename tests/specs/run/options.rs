//! Acquisition option specs

use crate::prelude::*;

#[test]
fn wait_acquires_free_lock() {
    Project::empty()
        .tenure()
        .args(&["--memory", "run", "jobs", "--wait", "--", "echo", "ok"])
        .passes()
        .stdout_eq("ok\n");
}

#[test]
fn timeout_acquires_free_lock() {
    Project::empty()
        .tenure()
        .args(&["--memory", "run", "jobs", "--timeout", "2s", "--", "echo", "ok"])
        .passes()
        .stdout_eq("ok\n");
}

#[test]
fn config_file_settings_apply() {
    let project = Project::empty();
    project.file("tenure.toml", "[lock]\nlease = \"2s\"\nrefresh_interval = \"5s\"\n");

    project
        .tenure()
        .args(&["--config", "tenure.toml", "--memory", "run", "jobs", "--", "true"])
        .fails()
        .stderr_has("refresh interval");
}
