// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store query surface consumed by the engine

use chrono::{DateTime, Utc};
use lk_core::{AccountId, Lease, LeaseSettings};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("lease {account_id} changed underneath (expected version {expected}, found {found})")]
    Conflict {
        account_id: AccountId,
        expected: u64,
        found: u64,
    },
    #[error("lease not found: {0}")]
    NotFound(AccountId),
    #[error("lease already exists: {0}")]
    AlreadyExists(AccountId),
}

impl StoreError {
    /// The store itself could not be reached, as opposed to a per-row outcome
    pub fn is_systemic(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Json(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Persistent lease rows, the settings singleton and scheduler bookkeeping
///
/// Writes are per row. `save_lease` is a compare-and-swap on
/// [`Lease::version`]: it fails with [`StoreError::Conflict`] when the row
/// changed since it was read, and bumps the caller's version on success.
pub trait LeaseStore: Send + Sync + 'static {
    fn get_settings(&self) -> Result<Option<LeaseSettings>, StoreError>;

    fn put_settings(&self, settings: &LeaseSettings) -> Result<(), StoreError>;

    /// All leases with `active = true`, ordered by account id
    ///
    /// A row that cannot be decoded is logged and omitted; only a failure to
    /// enumerate the rows at all is an error.
    fn list_active_leases(&self) -> Result<Vec<Lease>, StoreError>;

    /// Any lease row, active or historical
    fn get_lease(&self, account: &AccountId) -> Result<Option<Lease>, StoreError>;

    /// Create a new row; fails if any row exists for the account
    fn insert_lease(&self, lease: &mut Lease) -> Result<(), StoreError>;

    fn save_lease(&self, lease: &mut Lease) -> Result<(), StoreError>;

    /// Completion time of the last reconciliation pass
    fn last_run(&self) -> Result<Option<DateTime<Utc>>, StoreError>;

    fn record_run(&self, at: DateTime<Utc>) -> Result<(), StoreError>;
}
