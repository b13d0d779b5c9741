// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use lk_core::{Lease, LeaseSettings};
use serde::Serialize;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Daemon status as shown by `lk status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub uptime_secs: u64,
    pub running: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: DateTime<Utc>,
    pub active_leases: usize,
    pub settings: Option<LeaseSettings>,
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Uptime:        {}", format_uptime(self.uptime_secs))?;
        writeln!(
            f,
            "Reconciling:   {}",
            if self.running { "yes" } else { "no" }
        )?;
        match self.last_run {
            Some(at) => writeln!(f, "Last run:      {}", format_time(at))?,
            None => writeln!(f, "Last run:      never")?,
        }
        writeln!(f, "Next run:      {}", format_time(self.next_run))?;
        writeln!(f, "Active leases: {}", self.active_leases)?;
        match &self.settings {
            Some(settings) => write!(f, "{}", SettingsView(*settings)),
            None => write!(f, "Settings:      not configured"),
        }
    }
}

/// Lease settings as shown by `lk settings`
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct SettingsView(pub LeaseSettings);

impl fmt::Display for SettingsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.0;
        writeln!(
            f,
            "Enabled:       {}",
            if s.enabled { "yes" } else { "no" }
        )?;
        writeln!(f, "Lease days:    {}", s.default_lease_days)?;
        write!(f, "Notice days:   {}", s.default_notice_days)
    }
}

/// A lease returned by an administrative command
#[derive(Debug, Clone, Serialize)]
pub struct LeaseView {
    pub lease: Lease,
    pub notified: bool,
}

impl fmt::Display for LeaseView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lease = &self.lease;
        writeln!(f, "Account:       {}", lease.account_id)?;
        writeln!(f, "Owner:         {}", lease.owner)?;
        writeln!(
            f,
            "State:         {}",
            if lease.active { "active" } else { "inactive" }
        )?;
        writeln!(f, "Started:       {}", format_time(lease.start_date))?;
        writeln!(f, "Ends:          {}", format_time(lease.end_date))?;
        if let Some(note) = &lease.note {
            writeln!(f, "Note:          {}", note)?;
        }
        write!(
            f,
            "Owner notified: {}",
            if self.notified { "yes" } else { "no" }
        )
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, secs % 60)
    }
}
