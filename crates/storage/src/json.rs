// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON file-based storage
//!
//! Layout under the base directory:
//!
//! ```text
//! settings.json          LeaseSettings singleton
//! scheduler.json         last completed pass
//! leases/<id>.json       one file per lease row
//! ```
//!
//! Every write goes to a temp file which is synced and renamed into place,
//! so a crash never leaves a half-written row.

use crate::store::{LeaseStore, StoreError};
use chrono::{DateTime, Utc};
use lk_core::{AccountId, Lease, LeaseSettings};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const LEASES_DIR: &str = "leases";
const SETTINGS_FILE: &str = "settings.json";
const SCHEDULER_FILE: &str = "scheduler.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct SchedulerState {
    last_run: Option<DateTime<Utc>>,
}

/// JSON file-based lease store
pub struct JsonStore {
    base_path: PathBuf,
    /// Serializes read-compare-write sequences within this process
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Open a store at the given path, creating it if needed
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_path = base_path.into();
        fs::create_dir_all(base_path.join(LEASES_DIR))?;
        Ok(Self {
            base_path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn lease_path(&self, account: &AccountId) -> PathBuf {
        self.base_path
            .join(LEASES_DIR)
            .join(format!("{}.json", file_stem(account.as_str())))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        match fs::read_to_string(path) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(data)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl LeaseStore for JsonStore {
    fn get_settings(&self) -> Result<Option<LeaseSettings>, StoreError> {
        Self::load(&self.base_path.join(SETTINGS_FILE))
    }

    fn put_settings(&self, settings: &LeaseSettings) -> Result<(), StoreError> {
        let _guard = self.lock();
        Self::save(&self.base_path.join(SETTINGS_FILE), settings)
    }

    /// Rows that cannot be read or parsed are logged and left out
    fn list_active_leases(&self) -> Result<Vec<Lease>, StoreError> {
        let dir = self.base_path.join(LEASES_DIR);
        let mut leases = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match Self::load::<Lease>(&path) {
                    Ok(Some(lease)) if lease.active => leases.push(lease),
                    // Inactive, or removed between readdir and read
                    Ok(_) => {}
                    // One bad row must not hide the others
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = %e, "skipping unreadable lease row");
                    }
                }
            }
        }
        leases.sort_by(|a, b| a.account_id.cmp(&b.account_id));
        Ok(leases)
    }

    fn get_lease(&self, account: &AccountId) -> Result<Option<Lease>, StoreError> {
        Self::load(&self.lease_path(account))
    }

    fn insert_lease(&self, lease: &mut Lease) -> Result<(), StoreError> {
        let _guard = self.lock();
        let path = self.lease_path(&lease.account_id);
        if path.exists() {
            return Err(StoreError::AlreadyExists(lease.account_id.clone()));
        }
        lease.version = 1;
        Self::save(&path, lease)?;
        tracing::debug!(account = %lease.account_id, "lease inserted");
        Ok(())
    }

    fn save_lease(&self, lease: &mut Lease) -> Result<(), StoreError> {
        let _guard = self.lock();
        let path = self.lease_path(&lease.account_id);
        let current: Lease =
            Self::load(&path)?.ok_or_else(|| StoreError::NotFound(lease.account_id.clone()))?;
        if current.version != lease.version {
            return Err(StoreError::Conflict {
                account_id: lease.account_id.clone(),
                expected: lease.version,
                found: current.version,
            });
        }
        let mut next = lease.clone();
        next.version += 1;
        Self::save(&path, &next)?;
        lease.version = next.version;
        Ok(())
    }

    fn last_run(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let state: Option<SchedulerState> = Self::load(&self.base_path.join(SCHEDULER_FILE))?;
        Ok(state.and_then(|s| s.last_run))
    }

    fn record_run(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        let _guard = self.lock();
        Self::save(
            &self.base_path.join(SCHEDULER_FILE),
            &SchedulerState { last_run: Some(at) },
        )
    }
}

/// File name for an account id; bytes outside `[A-Za-z0-9_-]` are hex-escaped
fn file_stem(id: &str) -> String {
    let mut stem = String::with_capacity(id.len());
    for b in id.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            stem.push(char::from(b));
        } else {
            stem.push_str(&format!("%{:02X}", b));
        }
    }
    stem
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
