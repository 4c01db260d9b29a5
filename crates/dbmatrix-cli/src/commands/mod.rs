//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dbmatrix_core::PipelineConfig;

pub mod check;
pub mod graph;
pub mod run;
pub mod sync;

/// DBMatrix - relational schema to property graph sync
#[derive(Parser)]
#[command(name = "dbmatrix")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the TOML config file (defaults to ./dbmatrix.toml if present)
    #[arg(short, long, global = true, env = "DBMATRIX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the sync scheduler until interrupted
    Run,

    /// Run a single sync cycle now
    Sync(sync::SyncArgs),

    /// Create graph constraints and indexes
    InitSchema,

    /// Show per-database counts stored in the graph
    Status(graph::StatusArgs),

    /// Validate and print the effective configuration
    CheckConfig,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = PipelineConfig::load(self.config.as_deref())
            .context("Failed to load configuration")?;

        match self.command {
            Commands::Run => run::execute(&config).await,
            Commands::Sync(args) => sync::execute(args, &config).await,
            Commands::InitSchema => graph::init_schema(&config).await,
            Commands::Status(args) => graph::status(args, &config).await,
            Commands::CheckConfig => check::execute(&config),
        }
    }
}
