// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mail delivery through a sendmail-compatible command

use super::{NotifyAdapter, NotifyError};
use crate::process::{self, RunError};
use async_trait::async_trait;
use lk_core::NotifyConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Pipes an RFC 822 message into `<program> <args...>` (default `sendmail -t`)
#[derive(Clone, Debug)]
pub struct SendmailNotifier {
    program: PathBuf,
    args: Vec<String>,
    from: String,
    timeout: Duration,
}

impl SendmailNotifier {
    pub fn new(
        program: impl Into<PathBuf>,
        args: Vec<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            from: from.into(),
            timeout,
        }
    }

    pub fn from_config(config: &NotifyConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            config.from.clone(),
            config.timeout,
        )
    }

    fn build_message(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, NotifyError> {
        if recipient.trim().is_empty() || recipient.contains(['\r', '\n']) {
            return Err(NotifyError::InvalidRecipient(recipient.to_string()));
        }
        Ok(format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}",
            single_line(&self.from),
            recipient,
            single_line(subject),
            body.replace("\r\n", "\n").replace('\n', "\r\n"),
        ))
    }
}

#[async_trait]
impl NotifyAdapter for SendmailNotifier {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(recipient, subject, body)?;

        let output = process::run(&self.program, &self.args, Some(message.as_bytes()), self.timeout)
            .await
            .map_err(|e| match e {
                RunError::Spawn(e) => NotifyError::Launch(e),
                RunError::Io(e) => NotifyError::Failed(e.to_string()),
                RunError::Timeout(d) => NotifyError::Timeout(d),
            })?;

        if !output.success {
            return Err(NotifyError::Failed(output.diagnostic()));
        }
        Ok(())
    }
}

/// Fold header values onto one line so they cannot inject headers
fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

#[cfg(test)]
#[path = "sendmail_tests.rs"]
mod tests;
