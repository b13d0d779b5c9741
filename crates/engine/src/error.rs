// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use lk_adapters::{ProvisionError, MIN_PASSWORD_LEN};
use lk_core::{AccountId, AccountIdError, LeaseError, SettingsError, MAX_LEASE_DAYS};
use lk_storage::StoreError;
use thiserror::Error;

/// Systemic failure of a reconciliation pass
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
    #[error("stored settings are unusable: {0}")]
    InvalidSettings(#[source] SettingsError),
}

/// Errors surfaced synchronously by administrative operations
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("no active lease for {0}")]
    NotFound(AccountId),
    #[error("a lease already exists for {0}")]
    AlreadyExists(AccountId),
    #[error("invalid account id: {0}")]
    InvalidAccount(#[from] AccountIdError),
    #[error("password must be at least {min} characters", min = MIN_PASSWORD_LEN)]
    WeakPassword,
    #[error("extension must add at least one day")]
    InvalidDays,
    #[error("{0} days is out of range (at most {max})", max = MAX_LEASE_DAYS)]
    DaysOutOfRange(u32),
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AdminError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => AdminError::NotFound(id),
            StoreError::AlreadyExists(id) => AdminError::AlreadyExists(id),
            other => AdminError::Store(other),
        }
    }
}

impl From<LeaseError> for AdminError {
    fn from(e: LeaseError) -> Self {
        match e {
            LeaseError::Inactive(id) => AdminError::NotFound(id),
            LeaseError::InvalidDays => AdminError::InvalidDays,
            LeaseError::DaysOutOfRange(days) => AdminError::DaysOutOfRange(days),
        }
    }
}

/// Why a trigger did not produce a report
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("a reconciliation pass is already running")]
    AlreadyRunning,
    #[error("scheduler is shutting down")]
    ShuttingDown,
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
