//! CLI argument definitions for Flowsmith.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flowsmith_agent::config::DEFAULT_CONFIG_PATH;

/// Default location of the usage-statistics database.
pub const DEFAULT_DB_PATH: &str = "data/flowsmith.db";

/// Flowsmith -- turn plain-language descriptions into n8n workflows.
#[derive(Parser)]
#[command(
    name = "flowsmith",
    version,
    about = "Flowsmith -- generate importable n8n workflows from a description",
    long_about = "Sends a description to a language model, repairs the returned workflow \
                  document, and prints JSON ready for n8n's \"Import from clipboard\"."
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Path to the SQLite database holding usage statistics.
    #[arg(long, global = true, default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a workflow from a description.
    Generate {
        /// What the workflow should do.
        prompt: String,

        /// Write the JSON to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show usage statistics.
    Stats,

    /// Check that the completion endpoint accepts the configured key.
    Ping,
}
