// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome of one reconciliation pass

use lk_core::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Notice,
    Expiry,
}

/// One lease that could not be processed; retried on the next pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseFailure {
    pub account_id: AccountId,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub notices_sent: u32,
    pub notices_failed: u32,
    pub expired: u32,
    pub expirations_failed: u32,
    /// Due at scan time but no longer due when re-read
    pub skipped: u32,
    /// No settings record; the pass did nothing
    pub config_missing: bool,
    /// Settings have `enabled = false`; the pass did nothing
    pub disabled: bool,
    /// Stopped between leases by shutdown
    pub interrupted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<LeaseFailure>,
}

impl RunReport {
    pub(crate) fn config_missing() -> Self {
        Self {
            config_missing: true,
            ..Self::default()
        }
    }

    pub(crate) fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    pub(crate) fn record_failure(
        &mut self,
        account_id: &AccountId,
        kind: FailureKind,
        message: impl Into<String>,
    ) {
        match kind {
            FailureKind::Notice => self.notices_failed += 1,
            FailureKind::Expiry => self.expirations_failed += 1,
        }
        self.failures.push(LeaseFailure {
            account_id: account_id.clone(),
            kind,
            message: message.into(),
        });
    }

    /// Nothing was attempted
    pub fn is_empty(&self) -> bool {
        self.notices_sent == 0
            && self.notices_failed == 0
            && self.expired == 0
            && self.expirations_failed == 0
            && self.failures.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.config_missing {
            return write!(f, "skipped: no lease settings configured");
        }
        if self.disabled {
            return write!(f, "skipped: lease management disabled");
        }
        write!(
            f,
            "notices {} sent, {} failed; expirations {} done, {} failed; {} skipped",
            self.notices_sent,
            self.notices_failed,
            self.expired,
            self.expirations_failed,
            self.skipped
        )?;
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
