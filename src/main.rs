//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `fail2ban_exporter` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Exit status on fatal errors
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use fail2ban_exporter::initialization::init_logger_with;
use fail2ban_exporter::{run_exporter, Config, Opt};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments into Config
    let config = Config::from(Opt::parse());

    // Initialize logger based on config
    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    if let Err(e) = run_exporter(config).await {
        eprintln!("fail2ban_exporter error: {:#}", e);
        process::exit(1);
    }

    Ok(())
}
