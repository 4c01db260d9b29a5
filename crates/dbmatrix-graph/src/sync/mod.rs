//! Relational schema to Neo4j synchronization.
//!
//! One [`SchemaWriter::sync_schema`] call opens a single graph session, upserts
//! every table node, then upserts every foreign-key relationship, then commits.
//! The session is released on every exit path; an error before the commit
//! leaves the graph as it was.

pub mod foreign_key_sync;
pub mod table_sync;

use std::fmt;

use thiserror::Error;
use tracing::info;

use dbmatrix_core::{ForeignKeyInfo, TableInfo};

use crate::store::{GraphError, GraphSession, GraphStore};

/// Step of the write phase that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    OpenSession,
    Tables,
    ForeignKeys,
    Commit,
}

impl fmt::Display for WritePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenSession => "opening session",
            Self::Tables => "table upserts",
            Self::ForeignKeys => "foreign key upserts",
            Self::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// The write phase failed. The whole call must be treated as failed.
#[derive(Error, Debug)]
#[error("Failed to sync schema to graph during {phase}: {source}")]
pub struct GraphSyncError {
    pub phase: WritePhase,
    #[source]
    pub source: GraphError,
}

impl GraphSyncError {
    fn during(phase: WritePhase) -> impl FnOnce(GraphError) -> Self {
        move |source| Self { phase, source }
    }
}

/// Result of a sync operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub tables_upserted: usize,
    pub foreign_keys_linked: usize,
    /// Foreign keys whose source or target node was not found.
    pub foreign_keys_skipped: usize,
}

/// Writes discovered schema into a [`GraphStore`].
#[derive(Clone)]
pub struct SchemaWriter<S> {
    store: S,
}

impl<S: GraphStore> SchemaWriter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Upsert `tables` then `foreign_keys` within one session.
    pub async fn sync_schema(
        &self,
        tables: &[TableInfo],
        foreign_keys: &[ForeignKeyInfo],
    ) -> Result<SyncReport, GraphSyncError> {
        let mut session = self
            .store
            .session()
            .await
            .map_err(GraphSyncError::during(WritePhase::OpenSession))?;

        let tables_upserted = table_sync::upsert_tables(&mut session, tables)
            .await
            .map_err(GraphSyncError::during(WritePhase::Tables))?;

        let (foreign_keys_linked, foreign_keys_skipped) =
            foreign_key_sync::link_foreign_keys(&mut session, foreign_keys)
                .await
                .map_err(GraphSyncError::during(WritePhase::ForeignKeys))?;

        session
            .commit()
            .await
            .map_err(GraphSyncError::during(WritePhase::Commit))?;

        let report = SyncReport {
            tables_upserted,
            foreign_keys_linked,
            foreign_keys_skipped,
        };
        info!(
            tables = report.tables_upserted,
            foreign_keys = report.foreign_keys_linked,
            skipped = report.foreign_keys_skipped,
            "Synced schema to graph"
        );
        Ok(report)
    }
}
