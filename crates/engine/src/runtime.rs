// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime for the lease engine
//!
//! Owns the adapters, the store handle and the clock. Reconciliation lives
//! in `reconcile.rs` and the administrative operations in `admin.rs`; both
//! are `impl Runtime` blocks over the same dependencies.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lk_adapters::{NotifyAdapter, NotifyError, ProvisionAdapter, ProvisionError};
use lk_core::{AccountId, Clock, Config, Notice, Recipients};
use lk_storage::{LeaseStore, StoreError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, OwnedMutexGuard};

use crate::{ReconcileError, RunReport};

/// Attempts at a per-row compare-and-swap before giving up
pub(crate) const COMMIT_ATTEMPTS: u32 = 3;

/// Runtime behaviour configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Upper bound on any single adapter call
    pub call_timeout: Duration,
    pub recipients: Recipients,
    pub subject_prefix: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            recipients: Recipients::default(),
            subject_prefix: String::new(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            call_timeout: config.engine.call_timeout,
            recipients: Recipients::new(config.notify.default_domain.clone()),
            subject_prefix: config.notify.subject_prefix.clone(),
        }
    }
}

/// Per-account locks held across a read, adapter call and write
///
/// Reconciliation and the administrative cascades take the lock of the row
/// they touch, so an extension cannot land between an expiry's re-read and
/// its commit.
#[derive(Default)]
pub(crate) struct RowLocks {
    rows: Mutex<HashMap<AccountId, Arc<tokio::sync::Mutex<()>>>>,
}

impl RowLocks {
    pub(crate) async fn lock(&self, account: &AccountId) -> OwnedMutexGuard<()> {
        let row = {
            let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
            // Idle entries are only referenced by the map
            rows.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(rows.entry(account.clone()).or_default())
        };
        row.lock_owned().await
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.rows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Runtime adapter dependencies
pub struct RuntimeDeps<P, N, S> {
    pub provision: P,
    pub notify: N,
    pub store: Arc<S>,
}

/// Reconciliation engine plus administrative operations
pub struct Runtime<P, N, S, C: Clock> {
    pub(crate) provision: P,
    pub(crate) notify: N,
    pub(crate) store: Arc<S>,
    pub(crate) clock: C,
    pub(crate) config: RuntimeConfig,
    pub(crate) rows: RowLocks,
}

impl<P, N, S, C> Runtime<P, N, S, C>
where
    P: ProvisionAdapter,
    N: NotifyAdapter,
    S: LeaseStore,
    C: Clock,
{
    pub fn new(deps: RuntimeDeps<P, N, S>, clock: C, config: RuntimeConfig) -> Self {
        Self {
            provision: deps.provision,
            notify: deps.notify,
            store: deps.store,
            clock,
            config,
            rows: RowLocks::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run a provisioning call under the call timeout
    pub(crate) async fn bounded_provision<T>(
        &self,
        call: impl Future<Output = Result<T, ProvisionError>>,
    ) -> Result<T, ProvisionError> {
        let limit = self.config.call_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(ProvisionError::Timeout(limit)))
    }

    /// Deliver a notice under the call timeout
    pub(crate) async fn deliver(&self, notice: &Notice) -> Result<(), NotifyError> {
        let limit = self.config.call_timeout;
        tokio::time::timeout(
            limit,
            self.notify
                .notify(&notice.recipient, &notice.subject, &notice.body),
        )
        .await
        .unwrap_or(Err(NotifyError::Timeout(limit)))
    }

    /// Deliver a notice whose failure must not fail the caller
    pub(crate) async fn deliver_best_effort(&self, notice: &Notice) -> bool {
        match self.deliver(notice).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    recipient = %notice.recipient,
                    subject = %notice.subject,
                    error = %e,
                    "best-effort notice not delivered"
                );
                false
            }
        }
    }
}

/// A reconciliation target the scheduler can drive
#[async_trait]
pub trait Reconcile: Send + Sync + 'static {
    /// One full pass; `stop` is checked between leases
    async fn reconcile(
        &self,
        now: DateTime<Utc>,
        stop: &watch::Receiver<bool>,
    ) -> Result<RunReport, ReconcileError>;

    /// Completion marker of the last pass
    fn last_run(&self) -> Result<Option<DateTime<Utc>>, StoreError>;

    fn record_run(&self, at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait]
impl<P, N, S, C> Reconcile for Runtime<P, N, S, C>
where
    P: ProvisionAdapter,
    N: NotifyAdapter,
    S: LeaseStore,
    C: Clock,
{
    async fn reconcile(
        &self,
        now: DateTime<Utc>,
        stop: &watch::Receiver<bool>,
    ) -> Result<RunReport, ReconcileError> {
        self.reconcile_until(now, stop).await
    }

    fn last_run(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.store.last_run()
    }

    fn record_run(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.store.record_run(at)
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
