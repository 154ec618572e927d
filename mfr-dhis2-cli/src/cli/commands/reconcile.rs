//! `reconcile` and `reconcile-one` command handlers

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::fs;
use std::path::PathBuf;

use super::read_records;
use crate::api::Dhis2Client;
use crate::config::Config;
use crate::config::repository::SqliteFailedQueue;
use crate::models::FacilityRecord;
use crate::services::{BatchOrchestrator, BatchReport, ReconciliationOutcome, Reconciler};

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// JSON file with one facility record or an array of them
    #[arg(short, long)]
    pub input: PathBuf,

    /// Write the outcomes as JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ReconcileOneArgs {
    /// JSON file with a single facility record
    #[arg(short, long)]
    pub input: PathBuf,

    /// Overwrite the org unit if one already exists
    #[arg(long)]
    pub update: bool,
}

pub async fn handle_reconcile_command(args: ReconcileArgs, config: &Config) -> Result<()> {
    config.validate()?;

    let facilities: Vec<FacilityRecord> = read_records(&args.input)?;
    if facilities.is_empty() {
        println!("{}", "No facilities to reconcile".yellow());
        return Ok(());
    }

    let client = Dhis2Client::new(&config.dhis2, config.resilience())?;
    let queue = SqliteFailedQueue::open(&config.queue_database_path()).await?;
    let orchestrator = BatchOrchestrator::new(Reconciler::new(&client), &queue);

    let progress = |index: usize, total: usize, facility: &FacilityRecord| {
        eprintln!(
            "{} {}",
            format!("[{}/{}]", index + 1, total).dimmed(),
            facility.name
        );
    };
    let report = orchestrator
        .reconcile_batch(&facilities, Some(&progress))
        .await;

    let json = serde_json::to_string_pretty(&report.outcomes)
        .context("Failed to serialize reconciliation outcomes")?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            eprintln!("Outcomes written to {}", path.display().to_string().cyan());
        }
        None => println!("{}", json),
    }

    print_summary(&report);
    Ok(())
}

pub async fn handle_reconcile_one_command(args: ReconcileOneArgs, config: &Config) -> Result<()> {
    config.validate()?;

    let mut facilities: Vec<FacilityRecord> = read_records(&args.input)?;
    if facilities.len() != 1 {
        anyhow::bail!(
            "Expected exactly one facility in {}, found {}",
            args.input.display(),
            facilities.len()
        );
    }
    let facility = facilities.remove(0);

    let client = Dhis2Client::new(&config.dhis2, config.resilience())?;
    let reconciler = Reconciler::new(&client);

    let outcome = reconciler
        .reconcile(&facility, args.update)
        .await
        .with_context(|| format!("Failed to reconcile facility {}", facility.id))?;

    let line = match &outcome {
        ReconciliationOutcome::NoParentResolvable { facility_id } => format!(
            "{} no existing org unit for any ancestor of {}",
            "✗".red(),
            facility_id
        )
        .yellow()
        .to_string(),
        other => format!(
            "{} {} {} as {}",
            "✓".green(),
            facility.name.bold(),
            other.label(),
            other.org_unit_id().unwrap_or_default().cyan()
        ),
    };
    eprintln!("{}", line);

    let json = serde_json::to_string_pretty(&outcome)
        .context("Failed to serialize reconciliation outcome")?;
    println!("{}", json);
    Ok(())
}

fn print_summary(report: &BatchReport) {
    eprintln!();
    eprintln!("{}", "Reconciliation summary".bold());
    eprintln!("  created:   {}", report.count("created").to_string().green());
    eprintln!("  updated:   {}", report.count("updated").to_string().green());
    eprintln!("  unchanged: {}", report.count("unchanged"));
    if report.failed.is_empty() {
        eprintln!("  queued:    0");
    } else {
        eprintln!("  queued:    {}", report.failed.len().to_string().red());
        for entry in &report.failed {
            eprintln!("    {} {}", entry.facility_id.yellow(), entry.reason.dimmed());
        }
    }
}
