//! `tenure config` specs

use crate::prelude::*;

#[test]
fn defaults_are_printed() {
    Project::empty()
        .tenure()
        .args(&["config"])
        .passes()
        .stdout_has("[lock]")
        .stdout_has("lease = \"30s\"")
        .stdout_has("kind = \"exponential\"")
        .stdout_lacks("redis_url");
}

#[test]
fn explicit_config_file_is_used() {
    let project = Project::empty();
    project.file(
        "custom.toml",
        "redis_url = \"redis://cache:6379/1\"\n\n[lock]\nlease = \"1m\"\n",
    );

    project
        .tenure()
        .args(&["--config", "custom.toml", "config"])
        .passes()
        .stdout_has("redis_url = \"redis://cache:6379/1\"")
        .stdout_has("lease = \"1m\"");
}

#[test]
fn default_config_location_is_read() {
    let project = Project::empty();
    project.file("config/tenure/config.toml", "[lock]\nlease = \"45s\"\n");

    project
        .tenure()
        .args(&["config"])
        .passes()
        .stdout_has("lease = \"45s\"");
}

#[test]
fn environment_overrides_redis_url() {
    let project = Project::empty();
    project.file("custom.toml", "redis_url = \"redis://file:6379\"\n");

    project
        .tenure()
        .env("TENURE_REDIS_URL", "redis://env:6379")
        .args(&["--config", "custom.toml", "config"])
        .passes()
        .stdout_has("redis://env:6379");
}

#[test]
fn flag_overrides_environment() {
    Project::empty()
        .tenure()
        .env("TENURE_REDIS_URL", "redis://env:6379")
        .args(&["--redis-url", "redis://flag:6379", "config"])
        .passes()
        .stdout_has("redis://flag:6379");
}

#[test]
fn invalid_config_is_reported() {
    let project = Project::empty();
    project.file("bad.toml", "[lock]\nlease = 30\n");

    project
        .tenure()
        .args(&["--config", "bad.toml", "config"])
        .fails()
        .stderr_has("invalid config");
}
