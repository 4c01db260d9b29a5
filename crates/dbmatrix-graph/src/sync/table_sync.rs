//! Table synchronization to Neo4j.
//!
//! Syncs tables as (:Table {name, database}) nodes; `schema` and `updatedAt`
//! are refreshed on every pass.

use tracing::debug;

use dbmatrix_core::TableInfo;

use crate::store::{GraphResult, GraphSession, GraphStatement};

/// Upsert one node per table. Returns the number of statements applied.
pub async fn upsert_tables<S: GraphSession>(session: &mut S, tables: &[TableInfo]) -> GraphResult<usize> {
    for table in tables {
        session.run(&GraphStatement::UpsertTable(table)).await?;
        debug!(database = %table.database_name, table = %table.table_name, "Upserted table node");
    }
    Ok(tables.len())
}
