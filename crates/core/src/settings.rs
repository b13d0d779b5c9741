// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global lease settings

use crate::lease::{add_days, MAX_LEASE_DAYS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("default lease duration must be at least one day")]
    LeaseDaysTooShort,
    #[error("default lease duration of {0} days exceeds {max}", max = MAX_LEASE_DAYS)]
    LeaseDaysTooLong(u32),
    #[error("notice window of {0} days exceeds {max}", max = MAX_LEASE_DAYS)]
    NoticeDaysTooLong(u32),
    #[error("notice window of {0} days runs past the end of the calendar")]
    NoticeOutOfRange(u32),
}

/// Process-wide lease policy; at most one record exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseSettings {
    /// Master switch; reconciliation is a no-op while false
    pub enabled: bool,
    pub default_lease_days: u32,
    /// Days before expiry at which the owner is warned
    pub default_notice_days: u32,
}

impl Default for LeaseSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_lease_days: 180,
            default_notice_days: 7,
        }
    }
}

impl LeaseSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.default_lease_days == 0 {
            return Err(SettingsError::LeaseDaysTooShort);
        }
        if self.default_lease_days > MAX_LEASE_DAYS {
            return Err(SettingsError::LeaseDaysTooLong(self.default_lease_days));
        }
        if self.default_notice_days > MAX_LEASE_DAYS {
            return Err(SettingsError::NoticeDaysTooLong(self.default_notice_days));
        }
        Ok(())
    }

    /// Latest end date that falls inside the warning window
    pub fn notice_threshold(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, SettingsError> {
        let days = self.default_notice_days;
        if days > MAX_LEASE_DAYS {
            return Err(SettingsError::NoticeDaysTooLong(days));
        }
        add_days(now, days).ok_or(SettingsError::NoticeOutOfRange(days))
    }
}
