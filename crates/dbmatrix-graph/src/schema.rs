//! Neo4j schema initialization (constraints and indexes).

use tracing::info;

use crate::store::{GraphResult, GraphSession, GraphStatement, GraphStore};

/// Cypher statements for schema initialization.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // One node per (name, database)
    "CREATE CONSTRAINT table_identity IF NOT EXISTS FOR (t:Table) REQUIRE (t.name, t.database) IS UNIQUE",
    "CREATE INDEX table_database IF NOT EXISTS FOR (t:Table) ON (t.database)",
    // Speeds up the relationship MERGE lookup
    "CREATE INDEX foreign_key_identity IF NOT EXISTS FOR ()-[r:HAS_FOREIGN_KEY]-() ON (r.constraintName, r.database)",
];

/// Initialize graph constraints and indexes.
///
/// Safe to run multiple times - uses IF NOT EXISTS clauses.
pub async fn initialize_schema<S: GraphStore>(store: &S) -> GraphResult<()> {
    info!("Initializing graph schema...");

    let mut session = store.session().await?;
    for statement in SCHEMA_STATEMENTS {
        session.run(&GraphStatement::Schema(statement)).await?;
    }
    session.commit().await?;

    info!("Graph schema initialized ({} statements)", SCHEMA_STATEMENTS.len());
    Ok(())
}
