// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::{Path, PathBuf};
use std::time::Duration;

use lk_core::{Lease, LeaseSettings};
use lk_daemon::protocol::{self, ProtocolError};
use lk_daemon::{Request, Response};
use lk_engine::RunReport;
use thiserror::Error;
use tokio::net::UnixStream;
use tracing::debug;

use crate::output::StatusView;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests (status, extend, terminate, settings, shutdown)
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("LK_TIMEOUT_IPC_MS").unwrap_or(protocol::DEFAULT_TIMEOUT)
}

/// Timeout for a manual pass; the response arrives only when the pass ends
pub fn timeout_run() -> Duration {
    parse_duration_ms("LK_TIMEOUT_RUN_MS").unwrap_or(Duration::from_secs(30 * 60))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running (no socket at {0})")]
    DaemonNotRunning(PathBuf),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a manual reconciliation request
#[derive(Debug)]
pub enum RunOutcome {
    Finished(RunReport),
    AlreadyRunning,
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to a running daemon (no auto-start)
    pub fn connect(socket_path: &Path) -> Result<Self, ClientError> {
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning(socket_path.to_path_buf()));
        }
        Ok(Self {
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Send a request and receive a response with specific timeouts
    async fn send_with_timeout(
        &self,
        request: Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        debug!(request = request.kind(), socket = %self.socket_path.display(), "sending request");
        let stream = match UnixStream::connect(&self.socket_path).await {
            Ok(stream) => stream,
            // Socket file left behind by a daemon that died
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                return Err(ClientError::DaemonNotRunning(self.socket_path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(&request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes =
            tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        let response: Response = protocol::decode(&response_bytes)?;
        Ok(response)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Get daemon status
    pub async fn status(&self) -> Result<StatusView, ClientError> {
        match self.send(Request::Status).await? {
            Response::Status {
                uptime_secs,
                running,
                last_run,
                next_run,
                active_leases,
                settings,
            } => Ok(StatusView {
                uptime_secs,
                running,
                last_run,
                next_run,
                active_leases,
                settings,
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Trigger a reconciliation pass and wait for its report
    pub async fn run_now(&self) -> Result<RunOutcome, ClientError> {
        match self
            .send_with_timeout(Request::RunNow, timeout_run(), timeout_ipc())
            .await?
        {
            Response::Report { report } => Ok(RunOutcome::Finished(report)),
            Response::AlreadyRunning => Ok(RunOutcome::AlreadyRunning),
            Response::ShuttingDown => Err(ClientError::Rejected(
                "daemon is shutting down".to_string(),
            )),
            other => Err(unexpected(other)),
        }
    }

    pub async fn extend(&self, account_id: &str, days: u32) -> Result<(Lease, bool), ClientError> {
        let request = Request::Extend {
            account_id: account_id.to_string(),
            days,
        };
        lease_reply(self.send(request).await?)
    }

    pub async fn terminate(
        &self,
        account_id: &str,
        reason: &str,
    ) -> Result<(Lease, bool), ClientError> {
        let request = Request::Terminate {
            account_id: account_id.to_string(),
            reason: reason.to_string(),
        };
        lease_reply(self.send(request).await?)
    }

    pub async fn provision(
        &self,
        account_id: &str,
        owner: &str,
        password: String,
    ) -> Result<(Lease, bool), ClientError> {
        let request = Request::Provision {
            account_id: account_id.to_string(),
            owner: owner.to_string(),
            password,
        };
        lease_reply(self.send(request).await?)
    }

    pub async fn update_settings(&self, settings: LeaseSettings) -> Result<(), ClientError> {
        match self.send(Request::UpdateSettings { settings }).await? {
            Response::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

fn lease_reply(response: Response) -> Result<(Lease, bool), ClientError> {
    match response {
        Response::Lease { lease, notified } => Ok((lease, notified)),
        other => Err(unexpected(other)),
    }
}

fn unexpected(response: Response) -> ClientError {
    match response {
        Response::Error { message } => ClientError::Rejected(message),
        _ => ClientError::UnexpectedResponse,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
