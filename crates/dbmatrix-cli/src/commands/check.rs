//! Configuration check command.

use anyhow::Result;
use colored::Colorize;

use dbmatrix_core::PipelineConfig;

/// Print the effective configuration. Loading already validated it.
pub fn execute(config: &PipelineConfig) -> Result<()> {
    println!("{}", "Configuration OK".green().bold());
    println!("{}", "─".repeat(40));

    println!("{}", "Sync".bold());
    println!("  Interval:      {}s", config.sync.interval_secs);
    match config.sync.cycle_timeout_secs {
        Some(secs) => println!("  Cycle timeout: {}s", secs),
        None => println!("  Cycle timeout: {}", "none".dimmed()),
    }
    println!("  Run on start:  {}", config.sync.run_on_start);

    println!("{}", "Graph".bold());
    println!("  URI:           {}", config.graph.uri.cyan());
    println!("  User:          {}", config.graph.user);
    println!("  Database:      {}", config.graph.database);

    println!("{} ({})", "Databases".bold(), config.databases.len());
    for db in &config.databases {
        println!("  {} {}", db.name.cyan(), db.redacted_url().dimmed());
    }

    Ok(())
}
