//! Administrative lease specs
//!
//! Verify provision, extend, terminate and settings through the daemon.

use crate::prelude::*;

#[test]
fn settings_round_trip() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lk()
        .args(&["settings"])
        .passes()
        .stdout_has("No lease settings configured");

    temp.lk()
        .args(&["settings", "--lease-days", "90", "--notice-days", "14"])
        .passes()
        .stdout_has("Lease days:    90");

    temp.lk()
        .args(&["settings"])
        .passes()
        .stdout_has("Enabled:       yes")
        .stdout_has("Notice days:   14");
}

#[test]
fn zero_lease_days_is_rejected() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lk()
        .args(&["settings", "--lease-days", "0"])
        .fails()
        .stderr_has("invalid settings");
}

#[test]
fn provision_creates_account_and_lease() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lk()
        .args(&["provision", "ext-acme", "--owner", "alice"])
        .stdin("s3cret-pass\n")
        .passes()
        .stdout_has("Account:       ext-acme")
        .stdout_has("State:         active");

    assert!(temp.read("calls.log").contains("add-user ext-acme"));
    temp.lk()
        .args(&["status"])
        .passes()
        .stdout_has("Active leases: 1");
}

#[test]
fn provision_failure_creates_nothing() {
    let mut temp = Project::with_script(REFUSING_SCRIPT);
    temp.start_daemon();

    temp.lk()
        .args(&["provision", "ext-acme", "--owner", "alice"])
        .stdin("s3cret-pass\n")
        .fails()
        .stderr_has("user exists");

    temp.lk()
        .args(&["status"])
        .passes()
        .stdout_has("Active leases: 0");
}

#[test]
fn provision_refuses_unsafe_account_id() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lk()
        .args(&["provision", "ext/../root", "--owner", "alice"])
        .stdin("s3cret-pass\n")
        .fails()
        .stderr_has("invalid account id");

    assert!(!temp.path().join("calls.log").exists());
}

#[test]
fn provision_refuses_short_password() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lk()
        .args(&["provision", "ext-acme", "--owner", "alice"])
        .stdin("short\n")
        .fails()
        .stderr_has("at least 8 characters");

    temp.lk()
        .args(&["status"])
        .passes()
        .stdout_has("Active leases: 0");
}

#[test]
fn duplicate_provision_is_rejected() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lk()
        .args(&["provision", "ext-acme", "--owner", "alice"])
        .stdin("s3cret-pass\n")
        .passes();
    temp.lk()
        .args(&["provision", "ext-acme", "--owner", "bob"])
        .stdin("other-pass\n")
        .fails()
        .stderr_has("already exists");
}

#[test]
fn extend_then_terminate() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lk()
        .args(&["provision", "ext-acme", "--owner", "alice"])
        .stdin("s3cret-pass\n")
        .passes();

    temp.lk()
        .args(&["extend", "ext-acme", "30"])
        .passes()
        .stdout_has("State:         active");

    temp.lk()
        .args(&["terminate", "ext-acme", "--reason", "project cancelled"])
        .passes()
        .stdout_has("State:         inactive")
        .stdout_has("Note:          project cancelled");

    assert!(temp.read("calls.log").contains("del-user ext-acme"));
    temp.lk()
        .args(&["extend", "ext-acme", "30"])
        .fails()
        .stderr_has("no active lease");
}

#[test]
fn terminate_unknown_account_fails() {
    let mut temp = Project::empty();
    temp.start_daemon();

    temp.lk()
        .args(&["terminate", "ghost", "--reason", "cleanup"])
        .fails()
        .stderr_has("no active lease for ghost");
    assert!(!temp.read("calls.log").contains("del-user"));
}
