// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::Path;

/// Provisioner running a shell script written into `dir`
fn script(dir: &Path, body: &str, timeout: Duration) -> ScriptProvisioner {
    let path = dir.join("sftpctl.sh");
    std::fs::write(&path, format!("{}\n", body)).unwrap();
    ScriptProvisioner::new("sh", vec![path.display().to_string()], timeout)
}

#[test]
fn command_args_append_subcommand_and_account() {
    let provisioner = ScriptProvisioner::new(
        "/opt/sftpctl",
        vec!["--json".to_string()],
        Duration::from_secs(1),
    );
    assert_eq!(
        provisioner.command_args("del-user", &AccountId::new("ext-acme")),
        vec!["--json", "del-user", "ext-acme"]
    );
}

#[tokio::test]
async fn create_passes_password_on_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let provisioner = script(
        dir.path(),
        &format!(
            "read pw\necho \"$1 $2 $pw\" >> {}\necho created",
            log.display()
        ),
        Duration::from_secs(5),
    );

    let info = provisioner
        .create(&AccountId::new("ext-acme"), &Credentials::password("s3cret"))
        .await
        .unwrap();

    assert_eq!(info.account_id, AccountId::new("ext-acme"));
    assert_eq!(info.detail, "created");
    let logged = std::fs::read_to_string(&log).unwrap();
    assert_eq!(logged.trim(), "add-user ext-acme s3cret");
}

#[tokio::test]
async fn delete_succeeds_on_zero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let provisioner = script(
        dir.path(),
        "[ \"$1\" = del-user ] && [ \"$2\" = ext-acme ]",
        Duration::from_secs(5),
    );

    provisioner.delete(&AccountId::new("ext-acme")).await.unwrap();
}

#[tokio::test]
async fn delete_failure_carries_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let provisioner = script(
        dir.path(),
        "echo 'user ext-acme not found' >&2\nexit 2",
        Duration::from_secs(5),
    );

    let err = provisioner
        .delete(&AccountId::new("ext-acme"))
        .await
        .unwrap_err();

    match err {
        ProvisionError::Failed { code, message } => {
            assert_eq!(code, Some(2));
            assert_eq!(message, "user ext-acme not found");
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn hung_script_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let provisioner = script(dir.path(), "sleep 5", Duration::from_millis(100));

    let err = provisioner
        .delete(&AccountId::new("ext-acme"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::Timeout(_)));
}

#[tokio::test]
async fn missing_script_is_launch_error() {
    let provisioner =
        ScriptProvisioner::new("/nonexistent/sftpctl", vec![], Duration::from_secs(1));
    let err = provisioner
        .delete(&AccountId::new("ext-acme"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::Launch(_)));
}

#[test]
fn credentials_debug_is_redacted() {
    let creds = Credentials::password("s3cret");
    let debug = format!("{:?}", creds);
    assert!(!debug.contains("s3cret"));
    assert!(debug.contains("redacted"));
}

#[tokio::test]
async fn unsafe_account_id_never_reaches_the_script() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");
    let provisioner = script(
        dir.path(),
        &format!("touch {}", marker.display()),
        Duration::from_secs(5),
    );

    for id in ["-x", "/", "ext acme", "ext\u{1b}[2J"] {
        let err = provisioner
            .create(&AccountId::new(id), &Credentials::password("longenough"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidAccount { .. }), "{id:?}: {err}");
        let err = provisioner.delete(&AccountId::new(id)).await.unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidAccount { .. }), "{id:?}: {err}");
    }
    assert!(!marker.exists(), "script must not run for a rejected id");
}

#[test]
fn password_minimum_counts_characters() {
    assert!(!Credentials::password("short").meets_minimum());
    assert!(!Credentials::password("1234567").meets_minimum());
    assert!(Credentials::password("12345678").meets_minimum());
    assert!(Credentials::password("pässwört").meets_minimum());
}
