//! CLI error specs
//!
//! Verify failures are reported on stderr with a non-zero exit.

use crate::prelude::*;

#[test]
fn status_fails_when_daemon_not_running() {
    let temp = Project::empty();
    temp.lk()
        .args(&["status"])
        .fails()
        .stderr_has("Daemon not running");
}

#[test]
fn invalid_config_is_reported() {
    let temp = Project::empty();
    temp.file("config.toml", "[schedule]\nhour = 25\n");
    temp.lk()
        .args(&["status"])
        .fails()
        .stderr_has("schedule.hour");
}

#[test]
fn missing_config_file_is_reported() {
    let temp = Project::empty();
    std::fs::remove_file(temp.config_path()).unwrap();
    temp.lk()
        .args(&["status"])
        .fails()
        .stderr_has("failed to read config");
}

#[test]
fn unknown_command_fails() {
    let temp = Project::empty();
    temp.lk().args(&["renew"]).fails();
}

#[test]
fn extend_requires_numeric_days() {
    let temp = Project::empty();
    temp.lk()
        .args(&["extend", "ext-acme", "soon"])
        .fails()
        .stderr_has("invalid value");
}
