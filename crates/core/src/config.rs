// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon and CLI configuration
//!
//! Loaded from a TOML file. Every section and field has a default, so an
//! empty file (or no file at all) yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "LK_CONFIG";

/// Config file used when neither a flag nor `LK_CONFIG` names one
pub const DEFAULT_CONFIG_PATH: &str = "/etc/leasekeeper/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub schedule: ScheduleConfig,
    pub engine: EngineConfig,
    pub provision: ProvisionConfig,
    pub notify: NotifyConfig,
    pub daemon: DaemonConfig,
}

/// Where lease rows live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/lib/leasekeeper"),
        }
    }
}

/// Time zone the daily cadence is evaluated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleZone {
    #[default]
    Local,
    Utc,
}

/// Daily reconciliation cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub hour: u32,
    pub minute: u32,
    pub timezone: ScheduleZone,
    /// How late a missed trigger may still fire
    #[serde(with = "humantime_serde")]
    pub misfire_grace: Duration,
    /// Interval between scheduler liveness log lines
    #[serde(with = "humantime_serde")]
    pub heartbeat: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            hour: 2,
            minute: 0,
            timezone: ScheduleZone::Local,
            misfire_grace: Duration::from_secs(60 * 60),
            heartbeat: Duration::from_secs(6 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on any single provisioning or notifier call
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// External account management script
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    pub program: PathBuf,
    /// Arguments placed before the subcommand
    pub args: Vec<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("/opt/sftp/scripts/sftp_manager.py"),
            args: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Mail delivery through a sendmail-compatible command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub from: String,
    /// Appended to owners that are not full addresses
    pub default_domain: Option<String>,
    pub subject_prefix: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: PathBuf::from("/usr/sbin/sendmail"),
            args: vec!["-t".to_string()],
            from: "leasekeeper@localhost".to_string(),
            default_domain: None,
            subject_prefix: "[SFTP]".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Daemon file locations; unset paths live under the store directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub socket_path: Option<PathBuf>,
    pub pid_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load from an explicit path, `LK_CONFIG`, or the default location
    ///
    /// A missing default file yields the built-in defaults; a missing
    /// explicitly named file is an error.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let default = Path::new(DEFAULT_CONFIG_PATH);
        if default.exists() {
            Self::load(default)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.hour > 23 {
            return Err(ConfigError::Invalid(format!(
                "schedule.hour must be 0-23, got {}",
                self.schedule.hour
            )));
        }
        if self.schedule.minute > 59 {
            return Err(ConfigError::Invalid(format!(
                "schedule.minute must be 0-59, got {}",
                self.schedule.minute
            )));
        }
        if self.schedule.heartbeat.is_zero() {
            return Err(ConfigError::Invalid(
                "schedule.heartbeat must be non-zero".to_string(),
            ));
        }
        if self.engine.call_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "engine.call_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_path(&self) -> PathBuf {
        self.daemon
            .socket_path
            .clone()
            .unwrap_or_else(|| self.store.path.join("lkd.sock"))
    }

    pub fn pid_path(&self) -> PathBuf {
        self.daemon
            .pid_path
            .clone()
            .unwrap_or_else(|| self.store.path.join("lkd.pid"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.daemon
            .log_path
            .clone()
            .unwrap_or_else(|| self.store.path.join("logs").join("lkd.log"))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
