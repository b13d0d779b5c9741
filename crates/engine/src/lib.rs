// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Lease lifecycle engine: reconciliation, administrative operations and
//! the scheduler that drives them

mod admin;
mod error;
mod reconcile;
mod report;
mod runtime;
mod schedule;
mod scheduler;

#[cfg(test)]
mod test_helpers;

pub use admin::AdminOutcome;
pub use error::{AdminError, ReconcileError, TriggerError};
pub use report::{FailureKind, LeaseFailure, RunReport};
pub use runtime::{Reconcile, Runtime, RuntimeConfig, RuntimeDeps};
pub use schedule::DailySchedule;
pub use scheduler::{Scheduler, SchedulerConfig, Trigger};
