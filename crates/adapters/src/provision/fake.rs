// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake provisioning adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AccountInfo, Credentials, ProvisionAdapter, ProvisionError};
use async_trait::async_trait;
use lk_core::AccountId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded provisioning call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionCall {
    Create { account: AccountId },
    Delete { account: AccountId },
}

#[derive(Default)]
struct FakeState {
    calls: Vec<ProvisionCall>,
    accounts: HashSet<AccountId>,
    failing: HashSet<AccountId>,
    fail_all: bool,
    delay: Option<Duration>,
}

/// Fake provisioning adapter with call recording and failure injection
#[derive(Clone, Default)]
pub struct FakeProvisionAdapter {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProvisionAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ProvisionCall> {
        self.lock().calls.clone()
    }

    /// Accounts deleted so far, in call order
    pub fn deleted(&self) -> Vec<AccountId> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ProvisionCall::Delete { account } => Some(account.clone()),
                ProvisionCall::Create { .. } => None,
            })
            .collect()
    }

    /// Whether the fake currently holds the account
    pub fn has_account(&self, account: &AccountId) -> bool {
        self.lock().accounts.contains(account)
    }

    /// Make every call for `account` fail until cleared
    pub fn fail_for(&self, account: impl Into<AccountId>) {
        self.lock().failing.insert(account.into());
    }

    pub fn clear_failures(&self) {
        let mut state = self.lock();
        state.failing.clear();
        state.fail_all = false;
    }

    /// Make every call fail
    pub fn set_fail_all(&self, fail: bool) {
        self.lock().fail_all = fail;
    }

    /// Delay each call, e.g. to exercise timeouts
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.lock().delay = delay;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and decide whether it fails
    async fn enter(&self, call: ProvisionCall, account: &AccountId) -> Result<(), ProvisionError> {
        let delay = {
            let mut state = self.lock();
            state.calls.push(call);
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.lock();
        if state.fail_all || state.failing.contains(account) {
            return Err(ProvisionError::Failed {
                code: Some(1),
                message: format!("injected failure for {}", account),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ProvisionAdapter for FakeProvisionAdapter {
    async fn create(
        &self,
        account: &AccountId,
        _credentials: &Credentials,
    ) -> Result<AccountInfo, ProvisionError> {
        self.enter(
            ProvisionCall::Create {
                account: account.clone(),
            },
            account,
        )
        .await?;
        self.lock().accounts.insert(account.clone());
        Ok(AccountInfo {
            account_id: account.clone(),
            detail: "created".to_string(),
        })
    }

    async fn delete(&self, account: &AccountId) -> Result<(), ProvisionError> {
        self.enter(
            ProvisionCall::Delete {
                account: account.clone(),
            },
            account,
        )
        .await?;
        self.lock().accounts.remove(account);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
