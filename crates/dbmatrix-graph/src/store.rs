//! Graph statement executor abstraction.
//!
//! A [`GraphStore`] hands out [`GraphSession`]s; a session runs
//! [`GraphStatement`]s one at a time. Writes become visible on
//! [`GraphSession::commit`]; a session dropped without commit discards them.

use async_trait::async_trait;
use neo4rs::Query;
use thiserror::Error;

use dbmatrix_core::{ForeignKeyInfo, TableInfo};

/// Graph store error types.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    #[error("Failed to read field '{field}': {message}")]
    Decode { field: String, message: String },

    #[error("Graph store unavailable: {0}")]
    Unavailable(String),

    #[error("Statement rejected: {0}")]
    Rejected(String),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Upsert of one table node.
pub const UPSERT_TABLE_CYPHER: &str = "MERGE (t:Table {name: $tableName, database: $databaseName})
SET t.schema = $schemaName,
    t.updatedAt = datetime()
RETURN count(t) AS affected";

/// Upsert of one foreign-key relationship. Both endpoints must already exist
/// in the same database, otherwise nothing is written and `affected` is 0.
pub const LINK_FOREIGN_KEY_CYPHER: &str = "MATCH (source:Table {name: $sourceTable, database: $databaseName})
MATCH (target:Table {name: $targetTable, database: $databaseName})
MERGE (source)-[r:HAS_FOREIGN_KEY {
    constraintName: $constraintName,
    sourceColumn: $sourceColumn,
    targetColumn: $targetColumn,
    database: $databaseName
}]->(target)
SET r.updatedAt = datetime()
RETURN count(r) AS affected";

/// A parameterized statement understood by every [`GraphStore`].
#[derive(Debug, Clone, Copy)]
pub enum GraphStatement<'a> {
    /// Idempotent DDL (constraints, indexes).
    Schema(&'a str),
    UpsertTable(&'a TableInfo),
    LinkForeignKey(&'a ForeignKeyInfo),
}

impl GraphStatement<'_> {
    pub fn cypher(&self) -> &str {
        match self {
            Self::Schema(cypher) => cypher,
            Self::UpsertTable(_) => UPSERT_TABLE_CYPHER,
            Self::LinkForeignKey(_) => LINK_FOREIGN_KEY_CYPHER,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema(_) => "schema",
            Self::UpsertTable(_) => "upsert_table",
            Self::LinkForeignKey(_) => "link_foreign_key",
        }
    }

    /// Build the neo4rs query with its parameters bound.
    pub fn to_query(&self) -> Query {
        let query = Query::new(self.cypher().to_string());
        match self {
            Self::Schema(_) => query,
            Self::UpsertTable(table) => query
                .param("tableName", table.table_name.as_str())
                .param("databaseName", table.database_name.as_str())
                .param("schemaName", table.schema_name.as_str()),
            Self::LinkForeignKey(fk) => query
                .param("sourceTable", fk.source_table.as_str())
                .param("targetTable", fk.target_table.as_str())
                .param("databaseName", fk.database_name.as_str())
                .param("constraintName", fk.constraint_name.as_str())
                .param("sourceColumn", fk.source_column.as_str())
                .param("targetColumn", fk.target_column.as_str()),
        }
    }
}

/// What a statement touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatementOutcome {
    /// Nodes or relationships matched or created by the statement.
    pub affected: i64,
}

/// A scoped unit of work against the graph. Dropping it releases it.
#[async_trait]
pub trait GraphSession: Send {
    async fn run(&mut self, statement: &GraphStatement<'_>) -> GraphResult<StatementOutcome>;

    /// Make every statement run so far visible and release the session.
    async fn commit(self) -> GraphResult<()>;
}

/// Source of graph sessions.
#[async_trait]
pub trait GraphStore: Send + Sync {
    type Session: GraphSession;

    async fn session(&self) -> GraphResult<Self::Session>;
}
