// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leasekeeper daemon (lkd)
//!
//! Background process that runs the daily reconciliation and serves
//! administrative requests from `lk`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::{Path, PathBuf};

use lk_core::Config;
use lk_daemon::lifecycle::{self, LifecycleError};
use lk_daemon::server;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// Environment variable holding the log filter
const LOG_ENV: &str = "LK_LOG";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = parse_args(std::env::args().skip(1))?;
    let config = Config::discover(config_path.as_deref())?;
    let log_path = config.log_path();

    // Write startup marker to log (before tracing setup, so CLI can find it)
    write_startup_marker(&log_path)?;

    let log_guard = setup_logging(&log_path)?;

    info!(store = %config.store.path.display(), "Starting lkd");

    let mut daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&log_path, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        "Daemon ready, listening on {}",
        daemon.paths.socket_path.display()
    );

    // Signal ready for parent process (e.g., systemd)
    println!("READY");

    let shutdown = daemon.services.shutdown.clone();
    loop {
        tokio::select! {
            result = daemon.listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let services = daemon.services.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server::handle_connection(services, stream).await {
                                error!("Error handling connection: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                }
            }

            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }

            _ = shutdown.notified() => {
                info!("Shutdown requested via IPC, shutting down...");
                break;
            }
        }
    }

    daemon.shutdown().await?;
    info!("Daemon stopped");
    drop(log_guard);
    Ok(())
}

/// Accepts `--config <path>` / `--config=<path>`; nothing else
fn parse_args(args: impl Iterator<Item = String>) -> Result<Option<PathBuf>, String> {
    let mut args = args;
    let mut config = None;
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().ok_or("--config requires a path")?;
            config = Some(PathBuf::from(path));
        } else if let Some(path) = arg.strip_prefix("--config=") {
            config = Some(PathBuf::from(path));
        } else {
            return Err(format!("unexpected argument: {}\nusage: lkd [--config <path>]", arg));
        }
    }
    Ok(config)
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- lkd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- lkd: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(log_path: &Path) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(log_path: &Path, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    log_path: &Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = log_path
        .parent()
        .ok_or_else(|| LifecycleError::InvalidLogPath(log_path.to_path_buf()))?;
    let file_name = log_path
        .file_name()
        .ok_or_else(|| LifecycleError::InvalidLogPath(log_path.to_path_buf()))?;
    std::fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn no_arguments_means_discovery() {
        assert_eq!(parse_args(args(&[])).unwrap(), None);
    }

    #[test]
    fn config_flag_in_both_forms() {
        assert_eq!(
            parse_args(args(&["--config", "/etc/lk.toml"])).unwrap(),
            Some(PathBuf::from("/etc/lk.toml"))
        );
        assert_eq!(
            parse_args(args(&["--config=/etc/lk.toml"])).unwrap(),
            Some(PathBuf::from("/etc/lk.toml"))
        );
    }

    #[test]
    fn unknown_argument_is_rejected() {
        assert!(parse_args(args(&["--verbose"])).is_err());
        assert!(parse_args(args(&["--config"])).is_err());
    }

    #[test]
    fn startup_marker_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("logs").join("lkd.log");
        write_startup_marker(&log).unwrap();
        write_startup_marker(&log).unwrap();
        let text = std::fs::read_to_string(&log).unwrap();
        assert_eq!(text.matches(STARTUP_MARKER_PREFIX).count(), 2);
    }
}
