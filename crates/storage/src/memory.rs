// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process lease store

use crate::store::{LeaseStore, StoreError};
use chrono::{DateTime, Utc};
use lk_core::{AccountId, Lease, LeaseSettings};
use std::collections::BTreeMap;
use std::io;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    settings: Option<LeaseSettings>,
    leases: BTreeMap<AccountId, Lease>,
    last_run: Option<DateTime<Utc>>,
    unavailable: bool,
}

/// Lease store held in memory, with outage injection for tests
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: LeaseSettings) -> Self {
        let store = Self::default();
        store.lock().settings = Some(settings);
        store
    }

    /// Make every call fail as if the backing store were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Every row, active or not
    pub fn all_leases(&self) -> Vec<Lease> {
        self.lock().leases.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn available(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        let state = self.lock();
        if state.unavailable {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "store unavailable",
            )));
        }
        Ok(state)
    }
}

impl LeaseStore for MemoryStore {
    fn get_settings(&self) -> Result<Option<LeaseSettings>, StoreError> {
        Ok(self.available()?.settings)
    }

    fn put_settings(&self, settings: &LeaseSettings) -> Result<(), StoreError> {
        self.available()?.settings = Some(*settings);
        Ok(())
    }

    fn list_active_leases(&self) -> Result<Vec<Lease>, StoreError> {
        Ok(self
            .available()?
            .leases
            .values()
            .filter(|l| l.active)
            .cloned()
            .collect())
    }

    fn get_lease(&self, account: &AccountId) -> Result<Option<Lease>, StoreError> {
        Ok(self.available()?.leases.get(account).cloned())
    }

    fn insert_lease(&self, lease: &mut Lease) -> Result<(), StoreError> {
        let mut state = self.available()?;
        if state.leases.contains_key(&lease.account_id) {
            return Err(StoreError::AlreadyExists(lease.account_id.clone()));
        }
        lease.version = 1;
        state.leases.insert(lease.account_id.clone(), lease.clone());
        Ok(())
    }

    fn save_lease(&self, lease: &mut Lease) -> Result<(), StoreError> {
        let mut state = self.available()?;
        let current = state
            .leases
            .get_mut(&lease.account_id)
            .ok_or_else(|| StoreError::NotFound(lease.account_id.clone()))?;
        if current.version != lease.version {
            return Err(StoreError::Conflict {
                account_id: lease.account_id.clone(),
                expected: lease.version,
                found: current.version,
            });
        }
        lease.version += 1;
        *current = lease.clone();
        Ok(())
    }

    fn last_run(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.available()?.last_run)
    }

    fn record_run(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.available()?.last_run = Some(at);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
