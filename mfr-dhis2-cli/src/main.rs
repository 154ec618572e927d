use anyhow::Result;
use clap::Parser;
use log::debug;

use mfr_dhis2::cli::{Cli, commands};
use mfr_dhis2::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    debug!("Using queue database at {}", config.queue_database_path().display());

    commands::run(cli.command, &config).await
}
