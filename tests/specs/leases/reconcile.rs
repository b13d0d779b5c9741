//! Reconciliation specs
//!
//! Verify manual passes through `lk run-now`.

use crate::prelude::*;

#[test]
fn pass_without_settings_is_skipped() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lk()
        .args(&["run-now"])
        .passes()
        .stdout_has("skipped: no lease settings configured");
}

#[test]
fn disabled_settings_skip_pass() {
    let mut temp = Project::empty();
    temp.start_daemon();
    temp.lk().args(&["settings", "--disable"]).passes();

    temp.lk()
        .args(&["run-now"])
        .passes()
        .stdout_has("skipped: lease management disabled");
}

#[test]
fn expiring_lease_is_warned_once() {
    let mut temp = Project::empty();
    temp.start_daemon();
    temp.lk()
        .args(&["settings", "--lease-days", "3", "--notice-days", "7"])
        .passes();
    temp.lk()
        .args(&["provision", "ext-acme", "--owner", "alice"])
        .stdin("s3cret-pass\n")
        .passes();

    temp.lk()
        .args(&["run-now"])
        .passes()
        .stdout_has("notices 1 sent, 0 failed");

    temp.lk()
        .args(&["run-now"])
        .passes()
        .stdout_has("notices 0 sent, 0 failed");
}

#[test]
fn report_as_json() {
    let mut temp = Project::empty();
    temp.start_daemon();
    temp.lk().args(&["settings", "--enable"]).passes();

    let out = temp.lk().args(&["--output", "json", "run-now"]).passes();
    let json: serde_json::Value = serde_json::from_str(&out.stdout()).unwrap();
    assert_eq!(json["notices_sent"], 0);
    assert_eq!(json["expired"], 0);
}

#[test]
fn pass_records_last_run() {
    let mut temp = Project::empty();
    temp.start_daemon();
    temp.lk().args(&["settings", "--enable"]).passes();
    temp.lk().args(&["run-now"]).passes();

    temp.lk()
        .args(&["status"])
        .passes()
        .stdout_lacks("Last run:      never");
}
