//! create-tables - reset the Sparkify warehouse schema
//!
//! Drops every staging, dimension and fact table, then creates them empty.

use anyhow::{Context, Result};
use clap::Parser;
use sparkify_common::config::resolve_config_path;
use sparkify_common::WarehouseConfig;
use sparkify_etl::{logging, pipeline};
use std::path::PathBuf;
use tracing::info;

/// Command-line arguments for create-tables
#[derive(Parser, Debug)]
#[command(name = "create-tables")]
#[command(about = "Drop and recreate all Sparkify warehouse tables")]
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
        "Starting Sparkify schema reset (create-tables) v{} [{}] built {}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );
    info!("Configuration: {}", config_path.display());

    if args.dry_run {
        for statement in pipeline::reset_statements(config.dialect()) {
            println!("{}\n", statement);
        }
        return Ok(());
    }

    pipeline::reset_schema(&config)
        .await
        .context("Schema reset failed")?;

    Ok(())
}
