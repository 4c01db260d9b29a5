//! Graph maintenance commands.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use dbmatrix_core::PipelineConfig;
use dbmatrix_graph::{schema, GraphClient};

use crate::output;

#[derive(Args)]
pub struct StatusArgs {
    /// Print counts as JSON
    #[arg(long)]
    pub json: bool,
}

/// Create constraints and indexes.
pub async fn init_schema(config: &PipelineConfig) -> Result<()> {
    let client = GraphClient::open(&config.graph)
        .await
        .context("Failed to configure Neo4j client")?;

    schema::initialize_schema(&client).await?;

    println!(
        "{} {} statements applied",
        "Graph schema ready:".green().bold(),
        schema::SCHEMA_STATEMENTS.len()
    );
    Ok(())
}

/// Show table and foreign-key counts per database.
pub async fn status(args: StatusArgs, config: &PipelineConfig) -> Result<()> {
    let client = GraphClient::connect(&config.graph)
        .await
        .context("Failed to connect to Neo4j")?;

    let counts = client.schema_counts().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }

    println!("{}", "Schema Graph Status".bold());
    println!("{}", "─".repeat(40));
    output::print_counts(&counts);

    match client.last_synced_at().await? {
        Some(time) => println!("  Last sync:     {}", time.green()),
        None => println!("  Last sync:     {}", "never".yellow()),
    }

    let missing: Vec<&str> = config
        .database_names()
        .into_iter()
        .filter(|name| !counts.iter().any(|c| c.database == *name))
        .collect();
    if !missing.is_empty() {
        println!("  Not yet synced: {}", missing.join(", ").yellow());
    }
    println!("{}", "─".repeat(40));

    Ok(())
}
