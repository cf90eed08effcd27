//! Help output specs

use crate::prelude::*;

#[test]
fn help_lists_subcommands() {
    Project::empty()
        .tenure()
        .args(&["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("config");
}

#[test]
fn run_help_describes_options() {
    Project::empty()
        .tenure()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--lease")
        .stdout_has("--wait")
        .stdout_has("--timeout");
}

#[test]
fn version_flag_prints_version() {
    Project::empty()
        .tenure()
        .args(&["--version"])
        .passes()
        .stdout_has("tenure");
}
