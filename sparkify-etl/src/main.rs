//! etl - load the Sparkify warehouse
//!
//! Copies the activity logs and song metadata from object storage into the
//! staging tables, then transforms them into the star schema.

use anyhow::{Context, Result};
use clap::Parser;
use sparkify_common::config::resolve_config_path;
use sparkify_common::WarehouseConfig;
use sparkify_etl::{logging, pipeline};
use std::path::PathBuf;
use tracing::info;

/// Command-line arguments for etl
#[derive(Parser, Debug)]
#[command(name = "etl")]
#[command(about = "Load staging tables and populate the Sparkify star schema")]
#[command(version)]
struct Args {
    /// Path to the warehouse config file (default: $SPARKIFY_CONFIG, then dwh.toml search)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the statement sequence without connecting
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref())?;
    let config = WarehouseConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    logging::init_tracing(&config.logging);
    info!(
        "Starting Sparkify ETL (etl) v{} [{}] built {}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );
    info!("Configuration: {}", config_path.display());

    if args.dry_run {
        let staging = pipeline::staging_statements(&config)?;
        for statement in staging.iter().chain(&pipeline::transform_statements(&config)) {
            println!("{}\n", statement);
        }
        return Ok(());
    }

    let counts = pipeline::run_load(&config)
        .await
        .context("Load failed")?;

    for count in &counts {
        println!("{}", count);
    }

    Ok(())
}
