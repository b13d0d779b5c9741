// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn lease(id: &str) -> Lease {
    Lease::new(id, "alice", Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(), 30).unwrap()
}

#[test]
fn starts_without_settings() {
    assert_eq!(MemoryStore::new().get_settings().unwrap(), None);
    let store = MemoryStore::with_settings(LeaseSettings::default());
    assert_eq!(store.get_settings().unwrap(), Some(LeaseSettings::default()));
}

#[test]
fn compare_and_swap_on_version() {
    let store = MemoryStore::new();
    let mut first = lease("ext-a");
    store.insert_lease(&mut first).unwrap();
    let mut second = first.clone();

    first.mark_notice_sent().unwrap();
    store.save_lease(&mut first).unwrap();
    assert_eq!(first.version, 2);

    second.extend(10).unwrap();
    let err = store.save_lease(&mut second).unwrap_err();
    match err {
        StoreError::Conflict {
            expected, found, ..
        } => {
            assert_eq!(expected, 1);
            assert_eq!(found, 2);
        }
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[test]
fn duplicate_insert_is_rejected() {
    let store = MemoryStore::new();
    store.insert_lease(&mut lease("ext-a")).unwrap();
    let err = store.insert_lease(&mut lease("ext-a")).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
}

#[test]
fn inactive_rows_are_kept_but_not_listed() {
    let store = MemoryStore::new();
    let mut a = lease("ext-a");
    store.insert_lease(&mut a).unwrap();
    store.insert_lease(&mut lease("ext-b")).unwrap();
    a.mark_expired().unwrap();
    store.save_lease(&mut a).unwrap();

    assert_eq!(store.list_active_leases().unwrap().len(), 1);
    assert_eq!(store.all_leases().len(), 2);
}

#[test]
fn unavailable_store_fails_every_call() {
    let store = MemoryStore::new();
    store.insert_lease(&mut lease("ext-a")).unwrap();
    store.set_unavailable(true);

    assert!(store.list_active_leases().unwrap_err().is_systemic());
    assert!(store.get_settings().unwrap_err().is_systemic());
    assert!(store.last_run().is_err());

    store.set_unavailable(false);
    assert_eq!(store.list_active_leases().unwrap().len(), 1);
}
