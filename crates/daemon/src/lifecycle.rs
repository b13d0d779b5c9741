// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use fs2::FileExt;
use lk_adapters::{
    NoOpNotifyAdapter, NotifyAdapter, NotifyError, ScriptProvisioner, SendmailNotifier,
    TracedNotifyAdapter, TracedProvisionAdapter,
};
use lk_core::{Config, SystemClock};
use lk_engine::{Runtime, RuntimeConfig, RuntimeDeps, Scheduler, SchedulerConfig};
use lk_storage::{JsonStore, LeaseStore, StoreError};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::server::Services;

/// Mail delivery selected by `notify.enabled`
#[derive(Clone)]
pub enum DaemonNotifier {
    Sendmail(SendmailNotifier),
    Disabled(NoOpNotifyAdapter),
}

impl DaemonNotifier {
    pub fn from_config(config: &Config) -> Self {
        if config.notify.enabled {
            DaemonNotifier::Sendmail(SendmailNotifier::from_config(&config.notify))
        } else {
            DaemonNotifier::Disabled(NoOpNotifyAdapter::new())
        }
    }
}

#[async_trait]
impl NotifyAdapter for DaemonNotifier {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        match self {
            DaemonNotifier::Sendmail(n) => n.notify(recipient, subject, body).await,
            DaemonNotifier::Disabled(n) => n.notify(recipient, subject, body).await,
        }
    }
}

/// Daemon runtime with concrete adapter types (wrapped with tracing)
pub type DaemonRuntime = Runtime<
    TracedProvisionAdapter<ScriptProvisioner>,
    TracedNotifyAdapter<DaemonNotifier>,
    JsonStore,
    SystemClock,
>;

pub type DaemonServices = Services<
    TracedProvisionAdapter<ScriptProvisioner>,
    TracedNotifyAdapter<DaemonNotifier>,
    JsonStore,
    SystemClock,
>;

/// Daemon file locations
#[derive(Debug, Clone)]
pub struct DaemonPaths {
    pub socket_path: PathBuf,
    pub pid_path: PathBuf,
    pub log_path: PathBuf,
}

impl DaemonPaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            socket_path: config.socket_path(),
            pid_path: config.pid_path(),
            log_path: config.log_path(),
        }
    }
}

/// Daemon state during operation
pub struct DaemonState {
    pub paths: DaemonPaths,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
    pub services: DaemonServices,
    scheduler_task: Option<JoinHandle<()>>,
}

impl DaemonState {
    /// Shutdown the daemon gracefully
    ///
    /// Stops the scheduler (an in-flight pass ends before its next lease),
    /// then removes the socket and pid files.
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        self.services.scheduler.shutdown().await;
        if let Some(task) = self.scheduler_task.take() {
            if let Err(e) = task.await {
                warn!("Scheduler task ended abnormally: {}", e);
            }
        }

        if self.paths.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.paths.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        if self.paths.pid_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.paths.pid_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Invalid log path: {0}")]
    InvalidLogPath(PathBuf),

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    let paths = DaemonPaths::from_config(config);
    match startup_inner(config, &paths).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Clean up any resources created before failure
            cleanup_on_failure(&paths, &e);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config, paths: &DaemonPaths) -> Result<DaemonState, LifecycleError> {
    // 1. Create directories for socket and lock
    for path in [&paths.socket_path, &paths.pid_path] {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // 2. Acquire lock file FIRST - prevents races
    // Truncate only once the lock is held so a running daemon's pid survives
    let mut lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.pid_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Open the store BEFORE binding socket (fail fast)
    let store = Arc::new(JsonStore::open(&config.store.path)?);
    let active = store.list_active_leases()?.len();
    match store.get_settings()? {
        Some(settings) => info!(
            enabled = settings.enabled,
            default_lease_days = settings.default_lease_days,
            default_notice_days = settings.default_notice_days,
            active,
            "Loaded lease store"
        ),
        None => warn!(active, "Lease store has no settings; passes will do nothing until set"),
    }

    // 4. Set up adapters (wrapped with tracing for observability)
    let provision = TracedProvisionAdapter::new(ScriptProvisioner::from_config(&config.provision));
    let notify = TracedNotifyAdapter::new(DaemonNotifier::from_config(config));

    let runtime = Arc::new(Runtime::new(
        RuntimeDeps {
            provision,
            notify,
            store,
        },
        SystemClock,
        RuntimeConfig::from_config(config),
    ));
    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&runtime),
        SystemClock,
        SchedulerConfig::from_config(&config.schedule),
    ));

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if paths.socket_path.exists() {
        std::fs::remove_file(&paths.socket_path)?;
    }
    let listener = UnixListener::bind(&paths.socket_path)
        .map_err(|e| LifecycleError::BindFailed(paths.socket_path.clone(), e))?;

    // 6. Start the daily cadence
    let scheduler_task = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        async move { scheduler.run().await }
    });
    info!(next_fire = %scheduler.next_fire(), "Scheduler started");

    Ok(DaemonState {
        paths: paths.clone(),
        lock_file,
        listener,
        services: Services {
            runtime,
            scheduler,
            start_time: Instant::now(),
            shutdown: Arc::new(Notify::new()),
        },
        scheduler_task: Some(scheduler_task),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(paths: &DaemonPaths, error: &LifecycleError) {
    // Another daemon owns these files
    if matches!(error, LifecycleError::LockFailed(_)) {
        return;
    }

    if paths.socket_path.exists() {
        let _ = std::fs::remove_file(&paths.socket_path);
    }

    if paths.pid_path.exists() {
        let _ = std::fs::remove_file(&paths.pid_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
