// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: account provisioning and owner notification

pub mod notify;
mod process;
pub mod provision;
pub mod traced;

pub use notify::{NoOpNotifyAdapter, NotifyAdapter, NotifyError, SendmailNotifier};
pub use provision::{
    AccountInfo, Credentials, NoOpProvisionAdapter, ProvisionAdapter, ProvisionError,
    ScriptProvisioner, MIN_PASSWORD_LEN,
};
pub use traced::{TracedNotifyAdapter, TracedProvisionAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use provision::{FakeProvisionAdapter, ProvisionCall};
