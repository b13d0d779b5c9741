// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lk-core: data model for leasekeeper
//!
//! This crate provides:
//! - Lease records and their lifecycle transitions
//! - The process-wide lease settings singleton
//! - Clock abstraction for testable time handling
//! - Notice composition for lease owners
//! - Daemon/CLI configuration loading

pub mod clock;
pub mod config;
pub mod lease;
pub mod notice;
pub mod settings;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    Config, ConfigError, DaemonConfig, EngineConfig, NotifyConfig, ProvisionConfig,
    ScheduleConfig, ScheduleZone, StoreConfig,
};
pub use lease::{
    AccountId, AccountIdError, Lease, LeaseError, MAX_ACCOUNT_ID_LEN, MAX_LEASE_DAYS,
};
pub use notice::{Notice, Recipients};
pub use settings::{LeaseSettings, SettingsError};
