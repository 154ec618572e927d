//! Command-line interface definition

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{ApprovalArgs, QueueCommands, ReconcileArgs, ReconcileOneArgs};

#[derive(Debug, Parser)]
#[command(name = "mfr-dhis2", version, about = "Reconcile MFR facilities into DHIS2 org units")]
pub struct Cli {
    /// Path to a TOML config file (defaults to <config dir>/mfr-dhis2/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile a batch of facilities, updating existing org units
    Reconcile(ReconcileArgs),
    /// Reconcile a single facility
    ReconcileOne(ReconcileOneArgs),
    /// Mirror MFR facilities into the approval datastore
    Approval(ApprovalArgs),
    /// Inspect the failed queue
    #[command(subcommand)]
    Queue(QueueCommands),
}
