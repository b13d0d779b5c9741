// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::notify::FakeNotifyAdapter;
use crate::provision::FakeProvisionAdapter;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

// =============================================================================
// Precondition validation tests
// =============================================================================

#[tokio::test]
async fn traced_provision_rejects_empty_account() {
    let fake = FakeProvisionAdapter::default();
    let traced = TracedProvisionAdapter::new(fake.clone());

    let result = traced
        .create(&AccountId::new(""), &Credentials::password("pw"))
        .await;

    let err = result.unwrap_err();
    assert!(
        err.to_string().contains("account id must not be empty"),
        "Expected error about empty account, got: {}",
        err
    );
    assert!(fake.calls().is_empty(), "inner adapter must not be called");
}

#[tokio::test]
async fn traced_provision_rejects_option_like_account() {
    let fake = FakeProvisionAdapter::default();
    let traced = TracedProvisionAdapter::new(fake.clone());

    let err = traced.delete(&AccountId::new("-rf")).await.unwrap_err();

    assert!(matches!(err, ProvisionError::InvalidAccount { .. }), "{err}");
    assert!(fake.calls().is_empty(), "inner adapter must not be called");
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
fn traced_provision_create_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedProvisionAdapter::new(FakeProvisionAdapter::default());
        traced
            .create(&AccountId::new("ext-acme"), &Credentials::password("secret"))
            .await
    });

    assert!(result.is_ok(), "create should succeed: {:?}", result);
    assert!(
        logs.contains("provision.create"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("ext-acme"),
        "Should log account id. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("account created"),
        "Should log completion. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("elapsed_ms"),
        "Should log timing. Logs:\n{}",
        logs
    );
    assert!(!logs.contains("secret"), "Must not log credentials. Logs:\n{}", logs);
}

#[test]
fn traced_provision_delete_logs_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeProvisionAdapter::default();
        fake.fail_for("ext-acme");
        let traced = TracedProvisionAdapter::new(fake);
        traced.delete(&AccountId::new("ext-acme")).await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("delete failed"),
        "Should log failure. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("injected failure"),
        "Should log error detail. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_notify_logs_delivery() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedNotifyAdapter::new(FakeNotifyAdapter::default());
        traced
            .notify("alice@example.com", "lease expiring", "body")
            .await
    });

    assert!(result.is_ok());
    assert!(
        logs.contains("notify.send"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("alice@example.com"),
        "Should log recipient. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("notice sent"),
        "Should log completion. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_notify_failure_is_warning() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeNotifyAdapter::default();
        fake.set_fail(true);
        let traced = TracedNotifyAdapter::new(fake);
        traced.notify("alice@example.com", "s", "b").await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("WARN") && logs.contains("notice failed"),
        "Should warn on failure. Logs:\n{}",
        logs
    );
}

#[tokio::test]
async fn traced_wrappers_pass_through_to_inner() {
    let provision = FakeProvisionAdapter::default();
    let notify = FakeNotifyAdapter::default();
    let traced_provision = TracedProvisionAdapter::new(provision.clone());
    let traced_notify = TracedNotifyAdapter::new(notify.clone());

    traced_provision
        .create(&AccountId::new("ext-a"), &Credentials::password("pw"))
        .await
        .unwrap();
    traced_provision.delete(&AccountId::new("ext-a")).await.unwrap();
    traced_notify.notify("a@example.com", "s", "b").await.unwrap();

    assert_eq!(provision.calls().len(), 2);
    assert!(!provision.has_account(&AccountId::new("ext-a")));
    assert_eq!(notify.calls().len(), 1);
}
