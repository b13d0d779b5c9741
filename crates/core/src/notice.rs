// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notices sent to lease owners
//!
//! Maps lease lifecycle moments (upcoming expiry, extension, early
//! termination) to a recipient, subject and plain-text body.

use crate::lease::Lease;
use chrono::{DateTime, Utc};

/// A message ready for the notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Resolves lease owners to mail recipients
#[derive(Debug, Clone, Default)]
pub struct Recipients {
    default_domain: Option<String>,
}

impl Recipients {
    pub fn new(default_domain: Option<String>) -> Self {
        Self {
            default_domain: default_domain.filter(|d| !d.trim().is_empty()),
        }
    }

    /// Owners that already look like an address are used verbatim
    pub fn resolve(&self, owner: &str) -> String {
        match &self.default_domain {
            Some(domain) if !owner.contains('@') => format!("{}@{}", owner, domain),
            _ => owner.to_string(),
        }
    }
}

impl Notice {
    /// Warning that a lease ends soon
    pub fn expiring(
        lease: &Lease,
        recipient: String,
        days_remaining: i64,
        notice_days: u32,
        prefix: &str,
    ) -> Self {
        let end = lease.end_date.format("%Y-%m-%d");
        Self {
            recipient,
            subject: with_prefix(prefix, &format!("lease expiring: {}", lease.account_id)),
            body: format!(
                "Hello {owner},\n\n\
                 The external directory '{account}' you are responsible for expires in \
                 {days} day(s), on {end}.\n\
                 Owners are warned {notice_days} day(s) before expiry. Ask an administrator \
                 to extend the lease if access is still needed; otherwise the directory \
                 will be removed once the lease ends.\n",
                owner = lease.owner,
                account = lease.account_id,
                days = days_remaining,
            ),
        }
    }

    /// Confirmation that a lease was extended
    pub fn extended(lease: &Lease, recipient: String, days: u32, prefix: &str) -> Self {
        Self {
            recipient,
            subject: with_prefix(prefix, &format!("lease extended: {}", lease.account_id)),
            body: format!(
                "The lease on external directory '{}' was extended by {} day(s). \
                 The new end date is {}.\n",
                lease.account_id,
                days,
                lease.end_date.format("%Y-%m-%d"),
            ),
        }
    }

    /// Notice that a lease was ended early and its directory removed
    pub fn terminated(
        lease: &Lease,
        recipient: String,
        at: DateTime<Utc>,
        reason: &str,
        prefix: &str,
    ) -> Self {
        Self {
            recipient,
            subject: with_prefix(prefix, &format!("lease terminated: {}", lease.account_id)),
            body: format!(
                "The external directory '{}' was terminated and removed on {} \
                 for the following reason:\n\n{}\n",
                lease.account_id,
                at.format("%Y-%m-%d %H:%M"),
                reason,
            ),
        }
    }
}

fn with_prefix(prefix: &str, subject: &str) -> String {
    if prefix.is_empty() {
        subject.to_string()
    } else {
        format!("{} {}", prefix, subject)
    }
}

#[cfg(test)]
#[path = "notice_tests.rs"]
mod tests;
