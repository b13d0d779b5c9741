// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use std::sync::Arc;
use std::time::Instant;

use lk_adapters::{Credentials, NotifyAdapter, ProvisionAdapter};
use lk_core::{AccountId, Clock};
use lk_engine::{AdminError, AdminOutcome, Reconcile, Runtime, Scheduler, TriggerError};
use lk_storage::LeaseStore;
use tokio::net::UnixStream;
use tokio::sync::Notify;
use tracing::{debug, error};

use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT};

/// Everything a connection handler needs
pub struct Services<P, N, S, C: Clock> {
    pub runtime: Arc<Runtime<P, N, S, C>>,
    pub scheduler: Arc<Scheduler<Runtime<P, N, S, C>, C>>,
    pub start_time: Instant,
    /// Signalled when a client asks the daemon to stop
    pub shutdown: Arc<Notify>,
}

impl<P, N, S, C: Clock> Clone for Services<P, N, S, C> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            scheduler: Arc::clone(&self.scheduler),
            start_time: self.start_time,
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

/// Handle a single client connection
pub async fn handle_connection<P, N, S, C>(
    services: Services<P, N, S, C>,
    stream: UnixStream,
) -> Result<(), ServerError>
where
    P: ProvisionAdapter,
    N: NotifyAdapter,
    S: LeaseStore,
    C: Clock,
{
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!(request = ?request, "received request");

    let response = handle_request(&services, request).await;

    debug!(response = ?response, "sending response");

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle a single request and return a response
pub async fn handle_request<P, N, S, C>(services: &Services<P, N, S, C>, request: Request) -> Response
where
    P: ProvisionAdapter,
    N: NotifyAdapter,
    S: LeaseStore,
    C: Clock,
{
    let runtime = &services.runtime;
    match request {
        Request::Ping => Response::Pong,

        Request::Status => {
            let active_leases = match runtime.active_leases() {
                Ok(leases) => leases.len(),
                Err(e) => return error_response(e),
            };
            let settings = match runtime.settings() {
                Ok(settings) => settings,
                Err(e) => return error_response(e),
            };
            let last_run = match runtime.last_run() {
                Ok(last_run) => last_run,
                Err(e) => return error_response(e),
            };
            Response::Status {
                uptime_secs: services.start_time.elapsed().as_secs(),
                running: services.scheduler.is_running(),
                last_run,
                next_run: services.scheduler.next_fire(),
                active_leases,
                settings,
            }
        }

        Request::RunNow => match services.scheduler.run_now().await {
            Ok(report) => Response::Report { report },
            Err(TriggerError::AlreadyRunning) => Response::AlreadyRunning,
            Err(TriggerError::ShuttingDown) => Response::ShuttingDown,
            Err(e) => error_response(e),
        },

        Request::Extend { account_id, days } => lease_response(
            runtime
                .extend(&AccountId::new(account_id), days)
                .await,
        ),

        Request::Terminate { account_id, reason } => lease_response(
            runtime
                .terminate(&AccountId::new(account_id), &reason)
                .await,
        ),

        Request::Provision {
            account_id,
            owner,
            password,
        } => lease_response(
            runtime
                .provision(
                    &AccountId::new(account_id),
                    &owner,
                    &Credentials::password(password),
                )
                .await,
        ),

        Request::UpdateSettings { settings } => match runtime.update_settings(settings) {
            Ok(()) => Response::Ok,
            Err(e) => error_response(e),
        },

        Request::Shutdown => {
            services.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

fn lease_response(result: Result<AdminOutcome, AdminError>) -> Response {
    match result {
        Ok(AdminOutcome { lease, notified }) => Response::Lease { lease, notified },
        Err(e) => error_response(e),
    }
}

fn error_response(e: impl std::fmt::Display) -> Response {
    Response::Error {
        message: e.to_string(),
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
