//! One-shot sync command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use dbmatrix_catalog::CatalogReader;
use dbmatrix_core::PipelineConfig;
use dbmatrix_graph::{GraphClient, GraphStore, MemoryGraph, SchemaWriter};
use dbmatrix_sync::{CycleOutcome, CycleReport, SyncOrchestrator};

use crate::output;

#[derive(Args)]
pub struct SyncArgs {
    /// Discover schemas but write to an in-memory graph instead of Neo4j
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn execute(args: SyncArgs, config: &PipelineConfig) -> Result<()> {
    let reader = CatalogReader::from_config(config).context("Failed to configure catalog pools")?;

    if args.dry_run {
        println!("{}", "Dry run: nothing will be written to Neo4j".yellow());
        let graph = MemoryGraph::new();
        let report = run_once(reader.clone(), graph.clone(), config).await;
        reader.close().await;
        let report = report?;

        output::print_cycle_report(&report);
        println!();
        println!("{}", "Would write:".bold());
        output::print_counts(&graph.schema_counts());
        return Ok(());
    }

    // Opening the write session is the first round trip to the server.
    let client = GraphClient::open(&config.graph)
        .await
        .context("Failed to configure Neo4j client")?;

    println!("{}", "Syncing schemas to graph...".bold());
    let report = run_once(reader.clone(), client, config).await;
    reader.close().await;

    output::print_cycle_report(&report?);
    Ok(())
}

async fn run_once<S: GraphStore>(reader: CatalogReader, store: S, config: &PipelineConfig) -> Result<CycleReport> {
    let orchestrator = SyncOrchestrator::new(reader, SchemaWriter::new(store), &config.sync);

    match orchestrator.tick().await {
        CycleOutcome::Completed(report) => Ok(report),
        CycleOutcome::Failed(err) => Err(anyhow::Error::new(err).context("Schema sync failed")),
        CycleOutcome::Skipped => anyhow::bail!("Schema sync skipped, another cycle is running"),
    }
}
