// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests

use crate::{Runtime, RuntimeConfig, RuntimeDeps};
use chrono::{DateTime, Duration, TimeZone, Utc};
use lk_adapters::{FakeNotifyAdapter, FakeProvisionAdapter};
use lk_core::{AccountId, FakeClock, Lease, LeaseSettings, Recipients};
use lk_storage::{LeaseStore, MemoryStore};
use std::sync::Arc;

pub(crate) type TestRuntime =
    Runtime<FakeProvisionAdapter, FakeNotifyAdapter, MemoryStore, FakeClock>;

pub(crate) struct Harness {
    pub runtime: Arc<TestRuntime>,
    pub provision: FakeProvisionAdapter,
    pub notify: FakeNotifyAdapter,
    pub store: Arc<MemoryStore>,
    pub clock: FakeClock,
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 2, 0, 0).unwrap()
}

pub(crate) fn settings(notice_days: u32) -> LeaseSettings {
    LeaseSettings {
        enabled: true,
        default_lease_days: 180,
        default_notice_days: notice_days,
    }
}

pub(crate) fn harness_with(store: MemoryStore) -> Harness {
    let provision = FakeProvisionAdapter::new();
    let notify = FakeNotifyAdapter::new();
    let store = Arc::new(store);
    let clock = FakeClock::at(now());
    let runtime = Runtime::new(
        RuntimeDeps {
            provision: provision.clone(),
            notify: notify.clone(),
            store: Arc::clone(&store),
        },
        clock.clone(),
        RuntimeConfig {
            call_timeout: std::time::Duration::from_millis(200),
            recipients: Recipients::new(Some("example.com".to_string())),
            subject_prefix: "[SFTP]".to_string(),
        },
    );
    Harness {
        runtime: Arc::new(runtime),
        provision,
        notify,
        store,
        clock,
    }
}

/// Runtime over a store holding default settings with a 7-day notice window
pub(crate) fn harness() -> Harness {
    harness_with(MemoryStore::with_settings(settings(7)))
}

impl Harness {
    /// Insert an active lease ending `end_in` from now
    pub fn lease(&self, id: &str, end_in: Duration) -> Lease {
        let mut lease = Lease::new(id, "alice", now() - Duration::days(30), 30).unwrap();
        lease.end_date = now() + end_in;
        self.store.insert_lease(&mut lease).unwrap();
        lease
    }

    pub fn get(&self, id: &str) -> Lease {
        self.store.get_lease(&AccountId::new(id)).unwrap().unwrap()
    }
}
