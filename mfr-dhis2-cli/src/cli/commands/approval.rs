//! `approval` command handler

use anyhow::Result;
use clap::Args;
use colored::*;
use std::path::PathBuf;

use super::read_records;
use crate::api::Dhis2Client;
use crate::config::Config;
use crate::models::MfrFacility;
use crate::services::{ApprovalStoreSynchronizer, ApprovalSyncStatus};

#[derive(Debug, Args)]
pub struct ApprovalArgs {
    /// JSON file with one MFR facility document or an array of them
    #[arg(short, long)]
    pub input: PathBuf,

    /// Datastore namespace (overrides the configured one)
    #[arg(long)]
    pub namespace: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ApprovalTally {
    created: usize,
    updated: usize,
    skipped: usize,
    failed: usize,
}

impl ApprovalTally {
    fn add(&mut self, status: &ApprovalSyncStatus) {
        match status {
            ApprovalSyncStatus::Created => self.created += 1,
            ApprovalSyncStatus::Updated => self.updated += 1,
            ApprovalSyncStatus::Skipped => self.skipped += 1,
            ApprovalSyncStatus::Failed(_) => self.failed += 1,
        }
    }
}

pub async fn handle_approval_command(args: ApprovalArgs, config: &Config) -> Result<()> {
    config.validate()?;

    let facilities: Vec<MfrFacility> = read_records(&args.input)?;
    let namespace = args
        .namespace
        .unwrap_or_else(|| config.approval.namespace.clone());

    let client = Dhis2Client::new(&config.dhis2, config.resilience())?;
    let synchronizer = ApprovalStoreSynchronizer::new(&client, namespace);

    let mut tally = ApprovalTally::default();
    for facility in &facilities {
        let status = synchronizer.sync_approval_record(facility).await;
        if let ApprovalSyncStatus::Failed(reason) = &status {
            eprintln!("{} {}: {}", "✗".red(), facility.id(), reason.dimmed());
        }
        tally.add(&status);
    }

    println!(
        "Approval sync to {}: {} created, {} updated, {} skipped, {} failed",
        synchronizer.namespace().cyan(),
        tally.created.to_string().green(),
        tally.updated.to_string().green(),
        tally.skipped,
        if tally.failed > 0 {
            tally.failed.to_string().red()
        } else {
            tally.failed.to_string().normal()
        }
    );
    Ok(())
}
