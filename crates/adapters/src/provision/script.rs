// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioning through an external management script
//!
//! Invoked as `<program> <args...> add-user <account>` (password on stdin)
//! and `<program> <args...> del-user <account>`. Exit status is the only
//! thing interpreted.

use super::{AccountInfo, Credentials, ProvisionAdapter, ProvisionError};
use crate::process::{self, RunError};
use async_trait::async_trait;
use lk_core::{AccountId, ProvisionConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Real provisioning adapter backed by a script
#[derive(Clone, Debug)]
pub struct ScriptProvisioner {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ScriptProvisioner {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &ProvisionConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone(), config.timeout)
    }

    fn command_args(&self, subcommand: &str, account: &AccountId) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(subcommand.to_string());
        args.push(account.to_string());
        args
    }

    async fn invoke(
        &self,
        subcommand: &str,
        account: &AccountId,
        stdin: Option<&[u8]>,
    ) -> Result<String, ProvisionError> {
        ProvisionError::check_account(account)?;
        let args = self.command_args(subcommand, account);
        let output = process::run(&self.program, &args, stdin, self.timeout)
            .await
            .map_err(|e| match e {
                RunError::Spawn(e) => ProvisionError::Launch(e),
                RunError::Io(e) => ProvisionError::Io(e),
                RunError::Timeout(d) => ProvisionError::Timeout(d),
            })?;

        if !output.success {
            return Err(ProvisionError::Failed {
                code: output.code,
                message: output.diagnostic(),
            });
        }
        Ok(output.stdout.trim().to_string())
    }
}

#[async_trait]
impl ProvisionAdapter for ScriptProvisioner {
    async fn create(
        &self,
        account: &AccountId,
        credentials: &Credentials,
    ) -> Result<AccountInfo, ProvisionError> {
        let mut input = credentials.password.clone().into_bytes();
        input.push(b'\n');
        let detail = self.invoke("add-user", account, Some(&input)).await?;
        Ok(AccountInfo {
            account_id: account.clone(),
            detail,
        })
    }

    async fn delete(&self, account: &AccountId) -> Result<(), ProvisionError> {
        self.invoke("del-user", account, None).await.map(|_| ())
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
