// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lk - leasekeeper CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod output;

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use lk_core::{Config, LeaseSettings};

use crate::client::{DaemonClient, RunOutcome};
use crate::output::{LeaseView, OutputFormat, SettingsView};

#[derive(Parser)]
#[command(
    name = "lk",
    version,
    about = "leasekeeper - time-limited account lease management"
)]
struct Cli {
    /// Config file (defaults to $LK_CONFIG, then /etc/leasekeeper/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reconciliation pass now and print its report
    RunNow,
    /// Push a lease's end date later
    Extend {
        account: String,
        /// Days to add
        days: u32,
    },
    /// End a lease early and remove its account
    Terminate {
        account: String,
        #[arg(long)]
        reason: String,
    },
    /// Create an account and its lease (password of 8+ characters read from stdin)
    Provision {
        account: String,
        #[arg(long)]
        owner: String,
    },
    /// Show daemon and lease status
    Status,
    /// Show or change the lease settings
    Settings(SettingsArgs),
    /// Check that the daemon answers
    Ping,
    /// Stop the daemon
    Shutdown,
}

#[derive(Args)]
struct SettingsArgs {
    /// Turn reconciliation on
    #[arg(long, conflicts_with = "disable")]
    enable: bool,
    /// Turn reconciliation off
    #[arg(long)]
    disable: bool,
    /// Default lease duration for new accounts
    #[arg(long)]
    lease_days: Option<u32>,
    /// Days before expiry at which owners are warned
    #[arg(long)]
    notice_days: Option<u32>,
}

impl SettingsArgs {
    fn is_update(&self) -> bool {
        self.enable || self.disable || self.lease_days.is_some() || self.notice_days.is_some()
    }

    fn apply(&self, mut settings: LeaseSettings) -> LeaseSettings {
        if self.enable {
            settings.enabled = true;
        }
        if self.disable {
            settings.enabled = false;
        }
        if let Some(days) = self.lease_days {
            settings.default_lease_days = days;
        }
        if let Some(days) = self.notice_days {
            settings.default_notice_days = days;
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    let config = Config::discover(cli.config.as_deref())?;
    let client = DaemonClient::connect(&config.socket_path())?;
    let format = cli.output;

    match cli.command {
        Commands::RunNow => match client.run_now().await? {
            RunOutcome::Finished(report) => output::print(&report, format),
            RunOutcome::AlreadyRunning => {
                println!("A reconciliation pass is already running");
            }
        },

        Commands::Extend { account, days } => {
            let (lease, notified) = client.extend(&account, days).await?;
            output::print(&LeaseView { lease, notified }, format);
        }

        Commands::Terminate { account, reason } => {
            if reason.trim().is_empty() {
                bail!("a termination reason is required");
            }
            let (lease, notified) = client.terminate(&account, &reason).await?;
            output::print(&LeaseView { lease, notified }, format);
        }

        Commands::Provision { account, owner } => {
            let password = read_password(std::io::stdin().lock())?;
            let (lease, notified) = client.provision(&account, &owner, password).await?;
            output::print(&LeaseView { lease, notified }, format);
        }

        Commands::Status => {
            let status = client.status().await?;
            output::print(&status, format);
        }

        Commands::Settings(args) => {
            let current = client.status().await?.settings;
            if !args.is_update() {
                match current {
                    Some(settings) => output::print(&SettingsView(settings), format),
                    None => println!("No lease settings configured"),
                }
                return Ok(());
            }
            let settings = args.apply(current.unwrap_or_default());
            client.update_settings(settings).await?;
            output::print(&SettingsView(settings), format);
        }

        Commands::Ping => {
            client.ping().await?;
            println!("pong");
        }

        Commands::Shutdown => {
            client.shutdown().await?;
            println!("Daemon shutting down");
        }
    }

    Ok(())
}

/// First line of input, without its line ending
fn read_password(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("no password given on stdin");
    }
    Ok(password)
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("LK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
