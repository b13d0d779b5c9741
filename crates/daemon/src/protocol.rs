// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request protocol between `lk` and `lkd`
//!
//! Each message is a 4-byte big-endian length followed by a JSON body.
//! One request and one response per connection.

use chrono::{DateTime, Utc};
use lk_core::{Lease, LeaseSettings};
use lk_engine::RunReport;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted message body
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Default per-operation timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message of {size} bytes exceeds limit of {max}")]
    MessageTooLarge { size: usize, max: usize },
    #[error("connection closed")]
    ConnectionClosed,
    #[error("timed out")]
    Timeout,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Ping,
    Status,
    /// Manual reconciliation trigger
    RunNow,
    Extend {
        account_id: String,
        days: u32,
    },
    Terminate {
        account_id: String,
        reason: String,
    },
    Provision {
        account_id: String,
        owner: String,
        password: String,
    },
    UpdateSettings {
        settings: LeaseSettings,
    },
    Shutdown,
}

impl Request {
    /// Request kind, safe to log
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Ping => "ping",
            Request::Status => "status",
            Request::RunNow => "run-now",
            Request::Extend { .. } => "extend",
            Request::Terminate { .. } => "terminate",
            Request::Provision { .. } => "provision",
            Request::UpdateSettings { .. } => "update-settings",
            Request::Shutdown => "shutdown",
        }
    }
}

// Keeps passwords out of logs
impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::Provision {
                account_id, owner, ..
            } => f
                .debug_struct("Provision")
                .field("account_id", account_id)
                .field("owner", owner)
                .field("password", &"<redacted>")
                .finish(),
            Request::Extend { account_id, days } => f
                .debug_struct("Extend")
                .field("account_id", account_id)
                .field("days", days)
                .finish(),
            Request::Terminate { account_id, reason } => f
                .debug_struct("Terminate")
                .field("account_id", account_id)
                .field("reason", reason)
                .finish(),
            Request::UpdateSettings { settings } => f
                .debug_struct("UpdateSettings")
                .field("settings", settings)
                .finish(),
            other => f.write_str(other.kind()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Pong,
    Status {
        uptime_secs: u64,
        /// A reconciliation pass is in flight
        running: bool,
        last_run: Option<DateTime<Utc>>,
        next_run: DateTime<Utc>,
        active_leases: usize,
        settings: Option<LeaseSettings>,
    },
    Report {
        report: RunReport,
    },
    AlreadyRunning,
    Lease {
        lease: Lease,
        notified: bool,
    },
    Ok,
    ShuttingDown,
    Error {
        message: String,
    },
}

/// Serialize a message body (no length prefix)
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(message)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write one length-prefixed message
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed message
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }
    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).await?;
    Ok(data)
}

pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let data = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&data)
}

pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
