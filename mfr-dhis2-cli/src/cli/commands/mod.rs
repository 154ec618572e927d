//! Command handlers

pub mod approval;
pub mod queue;
pub mod reconcile;

pub use approval::{ApprovalArgs, handle_approval_command};
pub use queue::{QueueCommands, handle_queue_command};
pub use reconcile::{
    ReconcileArgs, ReconcileOneArgs, handle_reconcile_command, handle_reconcile_one_command,
};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use super::Commands;
use crate::config::Config;

/// Dispatch a parsed command
pub async fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Reconcile(args) => handle_reconcile_command(args, config).await,
        Commands::ReconcileOne(args) => handle_reconcile_one_command(args, config).await,
        Commands::Approval(args) => handle_approval_command(args, config).await,
        Commands::Queue(command) => handle_queue_command(command, config).await,
    }
}

/// Input files may hold a single record or an array of them
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Read a JSON file holding one record or a list of records
pub(crate) fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        anyhow::bail!("Input file does not exist: {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    let records: OneOrMany<T> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse input file: {}", path.display()))?;

    Ok(match records {
        OneOrMany::Many(records) => records,
        OneOrMany::One(record) => vec![record],
    })
}
