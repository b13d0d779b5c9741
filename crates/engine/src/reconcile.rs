// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation pass
//!
//! One pass reads the settings once, scans the active leases, and for every
//! lease that is due re-reads the row, calls the adapter, and commits the
//! outcome on its own. A failure on one lease is recorded in the report and
//! never touches another lease.

use crate::report::FailureKind;
use crate::runtime::{Runtime, COMMIT_ATTEMPTS};
use crate::{ReconcileError, RunReport};
use chrono::{DateTime, Utc};
use lk_adapters::{NotifyAdapter, ProvisionAdapter};
use lk_core::{Clock, Lease, LeaseSettings, Notice};
use lk_storage::LeaseStore;
use tokio::sync::watch;

/// Action a lease is due for in this pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Due {
    Notice,
    Expiry,
}

/// Split active leases into the expiring and expired sets
///
/// The sets are disjoint: a lease whose end date has been reached is only
/// ever expired, whether or not it was warned.
pub(crate) fn classify(
    leases: Vec<Lease>,
    now: DateTime<Utc>,
    threshold: DateTime<Utc>,
) -> (Vec<Lease>, Vec<Lease>) {
    let mut expiring = Vec::new();
    let mut expired = Vec::new();
    for lease in leases {
        if lease.is_expired(now) {
            expired.push(lease);
        } else if lease.is_expiring(now, threshold) {
            expiring.push(lease);
        }
    }
    (expiring, expired)
}

impl<P, N, S, C> Runtime<P, N, S, C>
where
    P: ProvisionAdapter,
    N: NotifyAdapter,
    S: LeaseStore,
    C: Clock,
{
    /// Run a complete pass at `now`
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<RunReport, ReconcileError> {
        let (_stop_tx, stop) = watch::channel(false);
        self.reconcile_until(now, &stop).await
    }

    /// Run a pass, stopping before the next lease once `stop` turns true
    pub async fn reconcile_until(
        &self,
        now: DateTime<Utc>,
        stop: &watch::Receiver<bool>,
    ) -> Result<RunReport, ReconcileError> {
        let settings = match self.store.get_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                tracing::warn!("no lease settings configured; nothing to do");
                return Ok(RunReport::config_missing());
            }
            Err(e) => return Err(ReconcileError::StoreUnavailable(e)),
        };
        if !settings.enabled {
            tracing::info!("lease management disabled; nothing to do");
            return Ok(RunReport::disabled());
        }

        let threshold = settings
            .notice_threshold(now)
            .map_err(ReconcileError::InvalidSettings)?;
        let leases = self
            .store
            .list_active_leases()
            .map_err(ReconcileError::StoreUnavailable)?;
        let scanned = leases.len();
        let (expiring, expired) = classify(leases, now, threshold);

        tracing::info!(
            %now,
            %threshold,
            scanned,
            expiring = expiring.len(),
            expired = expired.len(),
            "reconciliation pass started"
        );

        let work = expiring
            .into_iter()
            .map(|l| (Due::Notice, l))
            .chain(expired.into_iter().map(|l| (Due::Expiry, l)));

        let mut report = RunReport::default();
        for (due, lease) in work {
            if *stop.borrow() {
                tracing::info!("stop requested; ending pass before next lease");
                report.interrupted = true;
                break;
            }
            match due {
                Due::Notice => {
                    self.warn_owner(lease, now, threshold, &settings, &mut report)
                        .await
                }
                Due::Expiry => self.expire(lease, now, &mut report).await,
            }
        }

        tracing::info!(
            notices_sent = report.notices_sent,
            notices_failed = report.notices_failed,
            expired = report.expired,
            expirations_failed = report.expirations_failed,
            skipped = report.skipped,
            interrupted = report.interrupted,
            "reconciliation pass finished"
        );
        Ok(report)
    }

    /// Re-read a scanned lease and keep it only if it is still due
    fn still_due(
        &self,
        scanned: &Lease,
        due: Due,
        now: DateTime<Utc>,
        threshold: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Option<Lease> {
        let kind = match due {
            Due::Notice => FailureKind::Notice,
            Due::Expiry => FailureKind::Expiry,
        };
        let fresh = match self.store.get_lease(&scanned.account_id) {
            Ok(fresh) => fresh,
            Err(e) => {
                tracing::warn!(account = %scanned.account_id, error = %e, "lease re-read failed");
                report.record_failure(&scanned.account_id, kind, e.to_string());
                return None;
            }
        };
        let still_due = fresh.filter(|l| match due {
            Due::Notice => !l.is_expired(now) && l.is_expiring(now, threshold),
            Due::Expiry => l.is_expired(now),
        });
        if still_due.is_none() {
            tracing::info!(account = %scanned.account_id, ?due, "lease changed since scan; skipped");
            report.skipped += 1;
        }
        still_due
    }

    async fn warn_owner(
        &self,
        scanned: Lease,
        now: DateTime<Utc>,
        threshold: DateTime<Utc>,
        settings: &LeaseSettings,
        report: &mut RunReport,
    ) {
        let _row = self.rows.lock(&scanned.account_id).await;
        let Some(lease) = self.still_due(&scanned, Due::Notice, now, threshold, report) else {
            return;
        };

        let days_remaining = lease.days_remaining(now);
        let notice = Notice::expiring(
            &lease,
            self.config.recipients.resolve(&lease.owner),
            days_remaining,
            settings.default_notice_days,
            &self.config.subject_prefix,
        );
        if let Err(e) = self.deliver(&notice).await {
            tracing::warn!(account = %lease.account_id, error = %e, "expiry notice failed");
            report.record_failure(&lease.account_id, FailureKind::Notice, e.to_string());
            return;
        }

        report.notices_sent += 1;
        tracing::info!(
            target: "audit",
            account = %lease.account_id,
            owner = %lease.owner,
            days_remaining,
            end_date = %lease.end_date,
            "expiry notice sent"
        );
        self.commit_notice(lease);
    }

    /// Record a delivered notice against the end date it was sent for
    fn commit_notice(&self, mut lease: Lease) {
        let warned_for = lease.end_date;
        for attempt in 1..=COMMIT_ATTEMPTS {
            if lease.mark_notice_sent().is_err() {
                return;
            }
            match self.store.save_lease(&mut lease) {
                Ok(()) => return,
                Err(e) if e.is_conflict() => {
                    tracing::debug!(account = %lease.account_id, attempt, "notice commit conflict");
                    match self.store.get_lease(&lease.account_id) {
                        // Same epoch, still unwarned: apply again on the fresh row
                        Ok(Some(fresh))
                            if fresh.active && !fresh.notice_sent && fresh.end_date == warned_for =>
                        {
                            lease = fresh;
                        }
                        // Extended, terminated, or already marked: the warning is stale
                        Ok(_) => return,
                        Err(e) => {
                            tracing::error!(account = %lease.account_id, error = %e, "notice delivered but not recorded");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(account = %lease.account_id, error = %e, "notice delivered but not recorded");
                    return;
                }
            }
        }
        tracing::error!(account = %lease.account_id, "notice delivered but row kept changing");
    }

    async fn expire(&self, scanned: Lease, now: DateTime<Utc>, report: &mut RunReport) {
        let _row = self.rows.lock(&scanned.account_id).await;
        let Some(lease) = self.still_due(&scanned, Due::Expiry, now, now, report) else {
            return;
        };

        if let Err(e) = self
            .bounded_provision(self.provision.delete(&lease.account_id))
            .await
        {
            tracing::warn!(account = %lease.account_id, error = %e, "deprovisioning failed");
            report.record_failure(&lease.account_id, FailureKind::Expiry, e.to_string());
            return;
        }

        report.expired += 1;
        tracing::info!(
            target: "audit",
            account = %lease.account_id,
            owner = %lease.owner,
            end_date = %lease.end_date,
            "lease expired and account removed"
        );
        self.commit_expiry(lease, now);
    }

    /// Mark the row inactive; the account is gone, so a racing edit loses
    ///
    /// An extension that slipped in after the re-read is overridden and
    /// recorded on the audit target.
    fn commit_expiry(&self, mut lease: Lease, now: DateTime<Utc>) {
        let removed_at_end = lease.end_date;
        for attempt in 1..=COMMIT_ATTEMPTS {
            if lease.end_date > now {
                tracing::warn!(
                    target: "audit",
                    account = %lease.account_id,
                    removed_at_end = %removed_at_end,
                    extended_to = %lease.end_date,
                    "extension overridden: account already removed"
                );
                lease.annotate(format!(
                    "extension to {} overridden: account removed at expiry",
                    lease.end_date.format("%Y-%m-%d")
                ));
            }
            if lease.mark_expired().is_err() {
                return;
            }
            match self.store.save_lease(&mut lease) {
                Ok(()) => return,
                Err(e) if e.is_conflict() => {
                    tracing::debug!(account = %lease.account_id, attempt, "expiry commit conflict");
                    match self.store.get_lease(&lease.account_id) {
                        Ok(Some(fresh)) if fresh.active => lease = fresh,
                        Ok(_) => return,
                        Err(e) => {
                            tracing::error!(account = %lease.account_id, error = %e, "account removed but lease not closed");
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(account = %lease.account_id, error = %e, "account removed but lease not closed");
                    return;
                }
            }
        }
        tracing::error!(account = %lease.account_id, "account removed but row kept changing");
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
