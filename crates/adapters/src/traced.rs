// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::notify::{NotifyAdapter, NotifyError};
use crate::provision::{AccountInfo, Credentials, ProvisionAdapter, ProvisionError};
use async_trait::async_trait;
use lk_core::AccountId;

/// Wrapper that adds tracing to any ProvisionAdapter
#[derive(Clone)]
pub struct TracedProvisionAdapter<P> {
    inner: P,
}

impl<P> TracedProvisionAdapter<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: ProvisionAdapter> ProvisionAdapter for TracedProvisionAdapter<P> {
    async fn create(
        &self,
        account: &AccountId,
        credentials: &Credentials,
    ) -> Result<AccountInfo, ProvisionError> {
        let span = tracing::info_span!("provision.create", account = %account);
        let _guard = span.enter();

        tracing::info!("creating account");

        if let Err(e) = ProvisionError::check_account(account) {
            tracing::error!(error = %e, "account id rejected");
            return Err(e);
        }

        let start = std::time::Instant::now();
        let result = self.inner.create(account, credentials).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(info) => tracing::info!(
                elapsed_ms = elapsed.as_millis() as u64,
                detail = %info.detail,
                "account created"
            ),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "create failed"
            ),
        }

        result
    }

    async fn delete(&self, account: &AccountId) -> Result<(), ProvisionError> {
        let span = tracing::info_span!("provision.delete", account = %account);
        let _guard = span.enter();

        if let Err(e) = ProvisionError::check_account(account) {
            tracing::error!(error = %e, "account id rejected");
            return Err(e);
        }

        let start = std::time::Instant::now();
        let result = self.inner.delete(account).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "account deleted"),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "delete failed"
            ),
        }

        result
    }
}

/// Wrapper that adds tracing to any NotifyAdapter
#[derive(Clone)]
pub struct TracedNotifyAdapter<N> {
    inner: N,
}

impl<N> TracedNotifyAdapter<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<N: NotifyAdapter> NotifyAdapter for TracedNotifyAdapter<N> {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let span = tracing::info_span!("notify.send", recipient);
        let _guard = span.enter();

        tracing::debug!(subject, body_len = body.len(), "sending");

        let start = std::time::Instant::now();
        let result = self.inner.notify(recipient, subject, body).await;
        let elapsed = start.elapsed();

        // Notice failures never abort the caller, so warn rather than error
        match &result {
            Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "notice sent"),
            Err(e) => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "notice failed"
            ),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
