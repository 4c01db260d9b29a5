//! Scheduler command.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use dbmatrix_catalog::CatalogReader;
use dbmatrix_core::PipelineConfig;
use dbmatrix_graph::{schema, GraphClient, SchemaWriter};
use dbmatrix_sync::{Scheduler, SyncOrchestrator};

pub async fn execute(config: &PipelineConfig) -> Result<()> {
    let reader = CatalogReader::from_config(config).context("Failed to configure catalog pools")?;
    let client = GraphClient::open(&config.graph)
        .await
        .context("Failed to configure Neo4j client")?;

    // Not fatal: Neo4j may come up after us, and every cycle checks it again.
    if let Err(e) = schema::initialize_schema(&client).await {
        warn!(error = %e, "Could not initialize graph schema, continuing");
    }

    info!(
        databases = ?config.database_names(),
        graph = %config.graph.uri,
        interval_secs = config.sync.interval_secs,
        "Starting DBMatrix schema sync"
    );

    let orchestrator = Arc::new(SyncOrchestrator::new(
        reader,
        SchemaWriter::new(client),
        &config.sync,
    ));
    let scheduler = Scheduler::new(Arc::clone(&orchestrator), &config.sync);

    scheduler
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    orchestrator.reader().close().await;
    Ok(())
}
