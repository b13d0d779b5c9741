// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyCall {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<NotifyCall>,
    fail: bool,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

/// Fake notification adapter for testing
#[derive(Clone, Default)]
pub struct FakeNotifyAdapter {
    state: Arc<Mutex<FakeState>>,
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all delivered notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.lock().calls.clone()
    }

    /// Make every delivery fail until reset
    pub fn set_fail(&self, fail: bool) {
        self.lock().fail = fail;
    }

    /// Make deliveries to `recipient` fail
    pub fn fail_for(&self, recipient: &str) {
        self.lock().failing.insert(recipient.to_string());
    }

    /// Delay each delivery, e.g. to exercise timeouts
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.lock().delay = delay;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if state.fail || state.failing.contains(recipient) {
            return Err(NotifyError::Failed("injected failure".to_string()));
        }
        state.calls.push(NotifyCall {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
