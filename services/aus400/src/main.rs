//! Aus400 archive command-line tool.
//!
//! Searches the archive catalogue and runs the grid operations (grid
//! identification, cross-sections, regridding, vertical levels) on the
//! selected datasets, printing results as JSON.

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use aus400::{run, Archive, Cli};
use grid_processor::GridProcessorConfig;
use storage::ArchiveConfig;

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Cli::parse();

    // Initialize tracing on stderr so stdout stays valid JSON
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    netcdf_parser::silence_hdf5_errors();

    let mut config = match &args.config {
        Some(path) => ArchiveConfig::from_yaml(path)?,
        None => ArchiveConfig::from_env(),
    };
    if let Some(root) = &args.root {
        config.root = root.clone();
    }
    info!(root = %config.root.display(), "Opening archive");

    let processing = GridProcessorConfig::from_env();
    debug!(?processing, "Processing configuration");

    let archive = Archive::open(&config, processing)?;
    let output = run(&args.command, &archive)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
