// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lk-daemon: the leasekeeper daemon (lkd) and its IPC protocol
//!
//! The CLI links this crate for the wire types; the `lkd` binary drives
//! [`lifecycle`] and [`server`].

pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use protocol::{ProtocolError, Request, Response, DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE};
