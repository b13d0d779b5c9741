//! Daemon log specs
//!
//! Verify lkd writes its log file.

use crate::prelude::*;

#[test]
fn log_starts_with_marker() {
    let mut temp = Project::empty();
    temp.start_daemon();

    let log = std::fs::read_to_string(temp.log_path()).unwrap();
    assert!(log.contains("--- lkd: starting (pid: "));
}

#[test]
fn log_records_readiness() {
    let mut temp = Project::empty();
    temp.start_daemon();

    let ready = wait_for(SPEC_WAIT_MAX_MS, || {
        std::fs::read_to_string(temp.log_path())
            .map(|log| log.contains("Daemon ready"))
            .unwrap_or(false)
    });
    assert!(ready, "log should record readiness");
}

#[test]
fn failed_start_is_logged() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lkd().assert().failure();

    let logged = wait_for(SPEC_WAIT_MAX_MS, || {
        std::fs::read_to_string(temp.log_path())
            .map(|log| log.contains("Failed to start daemon"))
            .unwrap_or(false)
    });
    assert!(logged, "startup failure should be logged");
}
