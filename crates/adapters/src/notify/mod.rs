// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification adapters

mod noop;
mod sendmail;

pub use noop::NoOpNotifyAdapter;
pub use sendmail::SendmailNotifier;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from notification delivery
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification failed: {0}")]
    Failed(String),
    #[error("failed to launch mail command: {0}")]
    Launch(#[source] std::io::Error),
    #[error("notification timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid recipient: {0:?}")]
    InvalidRecipient(String),
}

/// Adapter for delivering notices to people
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    /// Send a message to one recipient
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}
