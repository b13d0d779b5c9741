// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account provisioning adapters
//!
//! The provisioning boundary creates and removes the managed directory
//! account on the underlying system. Callers only distinguish success from
//! failure; any output is opaque diagnostic text.

mod noop;
mod script;

pub use noop::NoOpProvisionAdapter;
pub use script::ScriptProvisioner;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProvisionAdapter, ProvisionCall};

use async_trait::async_trait;
use lk_core::{AccountId, AccountIdError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors from provisioning operations
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("provisioning command failed (exit {code:?}): {message}")]
    Failed { code: Option<i32>, message: String },
    #[error("failed to launch provisioning command: {0}")]
    Launch(#[source] std::io::Error),
    #[error("provisioning command timed out after {0:?}")]
    Timeout(Duration),
    #[error("provisioning I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("refusing account id {account:?}: {reason}")]
    InvalidAccount {
        account: String,
        reason: AccountIdError,
    },
}

impl ProvisionError {
    /// Reject ids the provisioning command could misread
    pub fn check_account(account: &AccountId) -> Result<(), Self> {
        account
            .validate()
            .map_err(|reason| ProvisionError::InvalidAccount {
                account: account.to_string(),
                reason,
            })
    }
}

/// Shortest password accepted for a new account
pub const MIN_PASSWORD_LEN: usize = 8;

/// Secret material for a new account
#[derive(Clone)]
pub struct Credentials {
    pub password: String,
}

impl Credentials {
    pub fn password(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    /// Password has at least `MIN_PASSWORD_LEN` characters
    pub fn meets_minimum(&self) -> bool {
        self.password.chars().count() >= MIN_PASSWORD_LEN
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What the provisioning side reported about a created account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub account_id: AccountId,
    /// Opaque output of the provisioning command
    pub detail: String,
}

/// Adapter for creating and deleting managed accounts
#[async_trait]
pub trait ProvisionAdapter: Clone + Send + Sync + 'static {
    /// Create the account and its directory
    async fn create(
        &self,
        account: &AccountId,
        credentials: &Credentials,
    ) -> Result<AccountInfo, ProvisionError>;

    /// Delete the account and its directory
    async fn delete(&self, account: &AccountId) -> Result<(), ProvisionError>;
}
