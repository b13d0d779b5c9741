// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op notification adapter for when mail is disabled.

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;

/// Notification adapter that drops every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpNotifyAdapter;

impl NoOpNotifyAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifyAdapter for NoOpNotifyAdapter {
    async fn notify(
        &self,
        _recipient: &str,
        _subject: &str,
        _body: &str,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}
