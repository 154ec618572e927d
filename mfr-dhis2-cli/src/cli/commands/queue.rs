//! `queue` command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::config::Config;
use crate::config::repository::SqliteFailedQueue;

#[derive(Debug, Subcommand)]
pub enum QueueCommands {
    /// List facilities waiting for retry
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every entry from the queue
    Clear,
}

pub async fn handle_queue_command(command: QueueCommands, config: &Config) -> Result<()> {
    let path = config.queue_database_path();
    let queue = SqliteFailedQueue::open(&path).await?;

    match command {
        QueueCommands::List { json } => {
            let entries = queue.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("{}", "Failed queue is empty".green());
                return Ok(());
            }

            println!("{} ({})", "Failed queue".bold(), path.display().to_string().dimmed());
            for entry in &entries {
                println!(
                    "  {} {} {}",
                    entry.enqueued_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
                    entry.facility_id.cyan(),
                    entry.reason
                );
            }
            println!("{} entries", entries.len());
        }
        QueueCommands::Clear => {
            let removed = queue.clear().await?;
            println!("Removed {} entries from the failed queue", removed.to_string().yellow());
        }
    }
    Ok(())
}
