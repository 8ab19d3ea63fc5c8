//! Command line interface

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::presenter::FixCategory;

#[derive(Debug, Parser)]
#[command(name = "vault-monitor", version, about = "Audit yearn vault metadata for anomalies")]
pub struct Cli {
    /// TOML config file (defaults to environment variables / .env)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Network to audit
    #[arg(long, global = true)]
    pub chain: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch once, probe icons and print every vault card
    Scan {
        /// Only show vaults and sections with anomalies
        #[arg(long)]
        only_anomalies: bool,

        /// Print a JSON report instead of cards
        #[arg(long)]
        json: bool,

        /// Skip icon probing (icons are reported valid)
        #[arg(long)]
        no_probe: bool,
    },

    /// Refresh periodically and redraw on every change
    Watch {
        #[arg(long)]
        only_anomalies: bool,

        /// Seconds between refresh cycles
        #[arg(long)]
        interval: Option<u64>,

        #[arg(long)]
        no_probe: bool,
    },

    /// Print remediation steps for one vault
    Fix {
        /// Vault address (any case)
        vault: String,

        #[arg(long, value_enum, default_value_t = FixKind::Ledger)]
        category: FixKind,

        /// Strategy address, for `--category description`
        #[arg(long)]
        strategy: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FixKind {
    Ledger,
    Description,
}

impl From<FixKind> for FixCategory {
    fn from(kind: FixKind) -> Self {
        match kind {
            FixKind::Ledger => FixCategory::Ledger,
            FixKind::Description => FixCategory::Description,
        }
    }
}

/// A line typed on stdin while watching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchInput {
    SwitchChain(u64),
    ToggleAnomalies,
    Refresh,
    Quit,
    Unknown(String),
}

pub const WATCH_HELP: &str =
    "Commands: <chain id> switch network | a toggle anomalies | r refresh | q quit";

pub fn parse_watch_input(line: &str) -> WatchInput {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "a" | "anomalies" => WatchInput::ToggleAnomalies,
        "r" | "refresh" => WatchInput::Refresh,
        "q" | "quit" | "exit" => WatchInput::Quit,
        other => match other.parse::<u64>() {
            Ok(chain_id) if chain_id > 0 => WatchInput::SwitchChain(chain_id),
            _ => WatchInput::Unknown(line.to_string()),
        },
    }
}
