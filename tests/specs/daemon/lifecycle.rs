//! Daemon lifecycle specs
//!
//! Verify lkd start, status and stop.

use crate::prelude::*;

#[test]
fn ping_answers_once_started() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lk().args(&["ping"]).passes().stdout_has("pong");
}

#[test]
fn daemon_creates_pid_and_socket_files() {
    let mut temp = Project::empty();
    temp.start_daemon();

    assert!(temp.socket_path().exists());
    let pid = std::fs::read_to_string(temp.store_path().join("lkd.pid")).unwrap();
    assert!(pid.trim().parse::<u32>().is_ok());
}

#[test]
fn status_on_fresh_store() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lk()
        .args(&["status"])
        .passes()
        .stdout_has("Uptime:")
        .stdout_has("Last run:      never")
        .stdout_has("Active leases: 0")
        .stdout_has("not configured");
}

#[test]
fn status_as_json() {
    let mut temp = Project::empty();
    temp.start_daemon();

    let out = temp.lk().args(&["--output", "json", "status"]).passes();
    let json: serde_json::Value = serde_json::from_str(&out.stdout()).unwrap();
    assert_eq!(json["active_leases"], 0);
    assert_eq!(json["running"], false);
}

#[test]
fn shutdown_stops_daemon_and_removes_files() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lk()
        .args(&["shutdown"])
        .passes()
        .stdout_has("Daemon shutting down");

    assert!(temp.wait_daemon_exit(), "daemon should exit after shutdown");
    assert!(!temp.socket_path().exists());
    assert!(!temp.store_path().join("lkd.pid").exists());

    temp.lk()
        .args(&["status"])
        .fails()
        .stderr_has("Daemon not running");
}

#[test]
fn second_daemon_refuses_to_start() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lkd().assert().failure();
    temp.lk().args(&["ping"]).passes();
}
