// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease records and lifecycle transitions
//!
//! A lease is the time-boxed authorization for one externally managed
//! directory account. Leases are never deleted: once `active` is false the
//! row is history and only its audit note may change.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest span, in days, any lease duration or extension may cover
pub const MAX_LEASE_DAYS: u32 = 36_500;

/// Longest accepted account id
pub const MAX_ACCOUNT_ID_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountIdError {
    #[error("account id must not be empty")]
    Empty,
    #[error("account id is longer than {max} characters", max = MAX_ACCOUNT_ID_LEN)]
    TooLong,
    #[error("account id must start with a letter, digit or '_'")]
    BadStart,
    #[error("account id contains {0:?}; allowed are letters, digits, '_', '.' and '-'")]
    BadChar(char),
}

/// Unique identifier of a managed account
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the id is safe to hand to the provisioning command as a
    /// positional argument and to use as a file name
    pub fn validate(&self) -> Result<(), AccountIdError> {
        let mut chars = self.0.chars();
        let first = chars.next().ok_or(AccountIdError::Empty)?;
        if self.0.len() > MAX_ACCOUNT_ID_LEN {
            return Err(AccountIdError::TooLong);
        }
        if !(first.is_ascii_alphanumeric() || first == '_') {
            return Err(AccountIdError::BadStart);
        }
        match chars.find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))) {
            Some(c) => Err(AccountIdError::BadChar(c)),
            None => Ok(()),
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaseError {
    #[error("lease for {0} is no longer active")]
    Inactive(AccountId),
    #[error("extension must add at least one day")]
    InvalidDays,
    #[error("{0} days is out of range (at most {max})", max = MAX_LEASE_DAYS)]
    DaysOutOfRange(u32),
}

/// `at` plus `days`, refusing spans past `MAX_LEASE_DAYS` or the calendar's end
pub(crate) fn add_days(at: DateTime<Utc>, days: u32) -> Option<DateTime<Utc>> {
    if days > MAX_LEASE_DAYS {
        return None;
    }
    at.checked_add_signed(Duration::days(i64::from(days)))
}

/// Lease on one managed account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub account_id: AccountId,
    /// Responsible party; resolved to the notice recipient
    pub owner: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// End date before the first extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_end_date: Option<DateTime<Utc>>,
    /// A warning for the current `end_date` has been delivered
    pub notice_sent: bool,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Row version, owned by the store
    #[serde(default)]
    pub version: u64,
}

impl Lease {
    /// Create a fresh active lease running `lease_days` from `start`
    pub fn new(
        account_id: impl Into<AccountId>,
        owner: impl Into<String>,
        start: DateTime<Utc>,
        lease_days: u32,
    ) -> Result<Self, LeaseError> {
        let end_date = add_days(start, lease_days).ok_or(LeaseError::DaysOutOfRange(lease_days))?;
        Ok(Self {
            account_id: account_id.into(),
            owner: owner.into(),
            start_date: start,
            end_date,
            original_end_date: None,
            notice_sent: false,
            active: true,
            note: None,
            version: 0,
        })
    }

    /// Whole days left before expiry, floored and never negative
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        if !self.active {
            return 0;
        }
        (self.end_date - now).num_days().max(0)
    }

    /// Due for deprovisioning
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.active && self.end_date <= now
    }

    /// Due for a warning: not yet expired, inside the notice window, not yet warned
    pub fn is_expiring(&self, now: DateTime<Utc>, threshold: DateTime<Utc>) -> bool {
        self.active && !self.notice_sent && now < self.end_date && self.end_date <= threshold
    }

    /// Push the end date out by `days`, re-arming the warning
    ///
    /// `original_end_date` keeps the earliest baseline across repeated extensions.
    pub fn extend(&mut self, days: u32) -> Result<(), LeaseError> {
        self.ensure_active()?;
        if days == 0 {
            return Err(LeaseError::InvalidDays);
        }
        let end_date = add_days(self.end_date, days).ok_or(LeaseError::DaysOutOfRange(days))?;
        self.original_end_date.get_or_insert(self.end_date);
        self.end_date = end_date;
        self.notice_sent = false;
        Ok(())
    }

    pub fn mark_notice_sent(&mut self) -> Result<(), LeaseError> {
        self.ensure_active()?;
        self.notice_sent = true;
        Ok(())
    }

    /// Record successful deprovisioning of an expired lease
    pub fn mark_expired(&mut self) -> Result<(), LeaseError> {
        self.ensure_active()?;
        self.active = false;
        Ok(())
    }

    /// End the lease early
    pub fn terminate(&mut self, now: DateTime<Utc>, reason: &str) -> Result<(), LeaseError> {
        self.ensure_active()?;
        self.active = false;
        self.end_date = now;
        self.note = Some(reason.to_string());
        Ok(())
    }

    /// Attach an audit note; allowed on history rows too
    pub fn annotate(&mut self, note: impl Into<String>) {
        self.note = Some(note.into());
    }

    fn ensure_active(&self) -> Result<(), LeaseError> {
        if self.active {
            Ok(())
        } else {
            Err(LeaseError::Inactive(self.account_id.clone()))
        }
    }
}

impl fmt::Display for Lease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.account_id,
            self.end_date.format("%Y-%m-%d")
        )
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
