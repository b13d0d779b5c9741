// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op provisioning adapter for dry runs.

use super::{AccountInfo, Credentials, ProvisionAdapter, ProvisionError};
use async_trait::async_trait;
use lk_core::AccountId;

/// Provisioning adapter that reports success without touching anything.
///
/// Used for dry runs and deployments where accounts are managed by hand.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpProvisionAdapter;

impl NoOpProvisionAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvisionAdapter for NoOpProvisionAdapter {
    async fn create(
        &self,
        account: &AccountId,
        _credentials: &Credentials,
    ) -> Result<AccountInfo, ProvisionError> {
        Ok(AccountInfo {
            account_id: account.clone(),
            detail: String::new(),
        })
    }

    async fn delete(&self, _account: &AccountId) -> Result<(), ProvisionError> {
        Ok(())
    }
}
