// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Administrative lease operations
//!
//! Each operation performs its whole cascade explicitly (adapter call, row
//! write, owner notice) and returns the combined result to the caller.

use crate::runtime::{Runtime, COMMIT_ATTEMPTS};
use crate::AdminError;
use lk_adapters::{Credentials, NotifyAdapter, ProvisionAdapter};
use lk_core::{AccountId, Clock, Lease, LeaseSettings, Notice};
use lk_storage::LeaseStore;
use serde::{Deserialize, Serialize};

/// Row written by an administrative operation, plus notice delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminOutcome {
    pub lease: Lease,
    /// The owner notice was delivered
    pub notified: bool,
}

impl<P, N, S, C> Runtime<P, N, S, C>
where
    P: ProvisionAdapter,
    N: NotifyAdapter,
    S: LeaseStore,
    C: Clock,
{
    /// Create the external account and open a lease for it
    ///
    /// The lease runs for the configured default, or 180 days when no
    /// settings record exists yet. The id and password are checked, and the
    /// lease built, before the account is created.
    pub async fn provision(
        &self,
        account: &AccountId,
        owner: &str,
        credentials: &Credentials,
    ) -> Result<AdminOutcome, AdminError> {
        account.validate()?;
        if !credentials.meets_minimum() {
            return Err(AdminError::WeakPassword);
        }
        let _row = self.rows.lock(account).await;
        if self.store.get_lease(account)?.is_some() {
            return Err(AdminError::AlreadyExists(account.clone()));
        }
        let settings = self.store.get_settings()?.unwrap_or_default();
        let mut lease = Lease::new(
            account.clone(),
            owner,
            self.clock.now(),
            settings.default_lease_days,
        )?;

        let info = self
            .bounded_provision(self.provision.create(account, credentials))
            .await?;

        if let Err(e) = self.store.insert_lease(&mut lease) {
            tracing::error!(account = %account, error = %e, "account created but lease not recorded");
            return Err(e.into());
        }

        tracing::info!(
            target: "audit",
            account = %account,
            owner,
            end_date = %lease.end_date,
            detail = %info.detail,
            "lease provisioned"
        );
        Ok(AdminOutcome {
            lease,
            notified: false,
        })
    }

    /// Push an active lease's end date out by `days` and re-arm its warning
    pub async fn extend(&self, account: &AccountId, days: u32) -> Result<AdminOutcome, AdminError> {
        if days == 0 {
            return Err(AdminError::InvalidDays);
        }

        let _row = self.rows.lock(account).await;
        let mut attempt = 1;
        let lease = loop {
            let mut lease = self.active_lease(account)?;
            lease.extend(days)?;
            match self.store.save_lease(&mut lease) {
                Ok(()) => break lease,
                Err(e) if e.is_conflict() && attempt < COMMIT_ATTEMPTS => {
                    tracing::debug!(account = %account, attempt, "extend conflict; retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(
            target: "audit",
            account = %account,
            days,
            end_date = %lease.end_date,
            "lease extended"
        );

        let notice = Notice::extended(
            &lease,
            self.config.recipients.resolve(&lease.owner),
            days,
            &self.config.subject_prefix,
        );
        let notified = self.deliver_best_effort(&notice).await;
        Ok(AdminOutcome { lease, notified })
    }

    /// Remove the external account and close the lease early
    ///
    /// A provisioning failure is returned as-is and leaves the row untouched.
    pub async fn terminate(
        &self,
        account: &AccountId,
        reason: &str,
    ) -> Result<AdminOutcome, AdminError> {
        let _row = self.rows.lock(account).await;
        let mut lease = self.active_lease(account)?;

        self.bounded_provision(self.provision.delete(account))
            .await?;

        let now = self.clock.now();
        let mut attempt = 1;
        let lease = loop {
            lease.terminate(now, reason)?;
            match self.store.save_lease(&mut lease) {
                Ok(()) => break lease,
                Err(e) if e.is_conflict() && attempt < COMMIT_ATTEMPTS => {
                    attempt += 1;
                    match self.store.get_lease(account)? {
                        Some(fresh) if fresh.active => lease = fresh,
                        // Closed concurrently, e.g. by an expiry pass
                        Some(fresh) => break fresh,
                        None => return Err(AdminError::NotFound(account.clone())),
                    }
                }
                Err(e) => {
                    tracing::error!(account = %account, error = %e, "account removed but lease not closed");
                    return Err(e.into());
                }
            }
        };

        tracing::info!(
            target: "audit",
            account = %account,
            reason,
            "lease terminated"
        );

        let notice = Notice::terminated(
            &lease,
            self.config.recipients.resolve(&lease.owner),
            now,
            reason,
            &self.config.subject_prefix,
        );
        let notified = self.deliver_best_effort(&notice).await;
        Ok(AdminOutcome { lease, notified })
    }

    /// Validate and store the settings singleton
    pub fn update_settings(&self, settings: LeaseSettings) -> Result<(), AdminError> {
        settings.validate()?;
        self.store.put_settings(&settings)?;
        tracing::info!(
            target: "audit",
            enabled = settings.enabled,
            default_lease_days = settings.default_lease_days,
            default_notice_days = settings.default_notice_days,
            "lease settings updated"
        );
        Ok(())
    }

    pub fn settings(&self) -> Result<Option<LeaseSettings>, AdminError> {
        Ok(self.store.get_settings()?)
    }

    /// Any lease row, active or historical
    pub fn lease(&self, account: &AccountId) -> Result<Option<Lease>, AdminError> {
        Ok(self.store.get_lease(account)?)
    }

    pub fn active_leases(&self) -> Result<Vec<Lease>, AdminError> {
        Ok(self.store.list_active_leases()?)
    }

    fn active_lease(&self, account: &AccountId) -> Result<Lease, AdminError> {
        match self.store.get_lease(account)? {
            Some(lease) if lease.active => Ok(lease),
            _ => Err(AdminError::NotFound(account.clone())),
        }
    }
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
