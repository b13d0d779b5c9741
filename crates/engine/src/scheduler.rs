// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler: daily timer, manual trigger and single-flight guard
//!
//! Every trigger, timed or manual, goes through one `try_lock` on the run
//! guard. A trigger that finds a pass in flight is dropped and reported as
//! [`TriggerError::AlreadyRunning`]; nothing is queued.

use crate::runtime::Reconcile;
use crate::schedule::DailySchedule;
use crate::{RunReport, TriggerError};
use chrono::{DateTime, Utc};
use lk_core::{Clock, ScheduleConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::Instrument;

/// Scheduler timing configuration
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub schedule: DailySchedule,
    /// How late a missed fire may still run
    pub misfire_grace: Duration,
    /// Interval between liveness log lines
    pub heartbeat: Duration,
}

impl SchedulerConfig {
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            schedule: DailySchedule::from_config(config),
            misfire_grace: config.misfire_grace,
            heartbeat: config.heartbeat,
        }
    }
}

/// What started a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Schedule,
    CatchUp,
    Manual,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Trigger::Schedule => "schedule",
            Trigger::CatchUp => "catch-up",
            Trigger::Manual => "manual",
        }
    }
}

pub struct Scheduler<R, C> {
    target: Arc<R>,
    clock: C,
    config: SchedulerConfig,
    guard: Mutex<()>,
    shutdown: watch::Sender<bool>,
}

impl<R: Reconcile, C: Clock> Scheduler<R, C> {
    pub fn new(target: Arc<R>, clock: C, config: SchedulerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            target,
            clock,
            config,
            guard: Mutex::new(()),
            shutdown,
        }
    }

    /// Manual trigger; bypasses the cadence but not the guard
    pub async fn run_now(&self) -> Result<RunReport, TriggerError> {
        self.trigger(Trigger::Manual).await
    }

    pub fn is_running(&self) -> bool {
        self.guard.try_lock().is_err()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn next_fire(&self) -> DateTime<Utc> {
        self.config.schedule.next_after(self.clock.now())
    }

    async fn trigger(&self, source: Trigger) -> Result<RunReport, TriggerError> {
        if self.is_shutting_down() {
            return Err(TriggerError::ShuttingDown);
        }
        let Ok(_running) = self.guard.try_lock() else {
            tracing::warn!(
                trigger = source.as_str(),
                "reconciliation already running; trigger dropped"
            );
            return Err(TriggerError::AlreadyRunning);
        };
        // Shutdown may have started while we took the guard
        if self.is_shutting_down() {
            return Err(TriggerError::ShuttingDown);
        }

        let now = self.clock.now();
        let stop = self.shutdown.subscribe();
        let span = tracing::info_span!("reconcile", trigger = source.as_str());
        let report = self.target.reconcile(now, &stop).instrument(span).await?;

        if !report.interrupted {
            if let Err(e) = self.target.record_run(now) {
                tracing::warn!(error = %e, "failed to record completed pass");
            }
        }
        Ok(report)
    }

    /// The missed fire that should still run, if any
    ///
    /// A fire is owed when the latest scheduled time is within the grace
    /// window of `now` and no pass completed since it.
    pub fn missed_fire(
        &self,
        now: DateTime<Utc>,
        last_run: Option<DateTime<Utc>>,
    ) -> Option<DateTime<Utc>> {
        let latest = self.config.schedule.latest_at_or_before(now);
        let late = (now - latest).to_std().ok()?;
        if late > self.config.misfire_grace {
            return None;
        }
        match last_run {
            Some(last) if last >= latest => None,
            _ => Some(latest),
        }
    }

    /// Run a missed fire at startup when it is still within the grace window
    pub async fn catch_up(&self) -> Option<Result<RunReport, TriggerError>> {
        let last_run = match self.target.last_run() {
            Ok(last) => last,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read last run; skipping catch-up");
                return None;
            }
        };
        let missed = self.missed_fire(self.clock.now(), last_run)?;
        tracing::info!(%missed, "running missed reconciliation within grace window");
        Some(self.trigger(Trigger::CatchUp).await)
    }

    /// Drive the daily cadence until shutdown
    pub async fn run(&self) {
        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            return;
        }

        if let Some(result) = self.catch_up().await {
            log_outcome(Trigger::CatchUp, &result);
        }

        let mut heartbeat = tokio::time::interval(self.config.heartbeat);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        heartbeat.tick().await;

        let mut last_fire: Option<DateTime<Utc>> = None;
        loop {
            let now = self.clock.now();
            let from = last_fire.map_or(now, |fired| fired.max(now));
            let next = self.config.schedule.next_after(from);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = heartbeat.tick() => {
                    tracing::info!(
                        next_fire = %next,
                        running = self.is_running(),
                        "scheduler alive"
                    );
                }
                _ = tokio::time::sleep(wait) => {
                    last_fire = Some(next);
                    let woke = self.clock.now();
                    let late = (woke - next).to_std().unwrap_or(Duration::ZERO);
                    if late > self.config.misfire_grace {
                        tracing::warn!(
                            scheduled = %next,
                            late_secs = late.as_secs(),
                            "fire missed beyond grace window; waiting for next cadence"
                        );
                        continue;
                    }
                    let result = self.trigger(Trigger::Schedule).await;
                    log_outcome(Trigger::Schedule, &result);
                }
            }
        }
        tracing::info!("scheduler stopped");
    }

    /// Stop accepting triggers and wait for an in-flight pass to end
    ///
    /// The running pass sees the stop flag and returns before its next lease.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        if self.is_running() {
            tracing::info!("waiting for in-flight reconciliation to finish");
        }
        let _drained = self.guard.lock().await;
    }
}

fn log_outcome(source: Trigger, result: &Result<RunReport, TriggerError>) {
    match result {
        Ok(report) if report.has_failures() => {
            tracing::warn!(trigger = source.as_str(), %report, "reconciliation finished with failures")
        }
        Ok(report) => tracing::info!(trigger = source.as_str(), %report, "reconciliation finished"),
        Err(TriggerError::Reconcile(e)) => {
            tracing::error!(trigger = source.as_str(), error = %e, "reconciliation aborted")
        }
        Err(e) => tracing::info!(trigger = source.as_str(), error = %e, "trigger not run"),
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
