//! In-memory graph store.
//!
//! Applies the same find-or-create rules as the Cypher statements: table
//! nodes match on `(name, database)`, foreign-key edges match on their
//! endpoints plus `(constraintName, sourceColumn, targetColumn, database)`.
//! Used for dry runs and as the graph double in tests.
//!
//! A session stages its writes against a snapshot taken when it opened;
//! `commit` publishes the snapshot, dropping the session discards it.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use dbmatrix_core::{ForeignKeyInfo, TableInfo};

use crate::status::DatabaseCounts;
use crate::store::{GraphError, GraphResult, GraphSession, GraphStatement, GraphStore, StatementOutcome};

/// A `(:Table)` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNode {
    pub name: String,
    pub database: String,
    pub schema: String,
    pub updated_at: DateTime<Utc>,
}

/// A `[:HAS_FOREIGN_KEY]` relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyEdge {
    pub source_table: String,
    pub target_table: String,
    pub constraint_name: String,
    pub source_column: String,
    pub target_column: String,
    pub database: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
struct GraphData {
    nodes: Vec<TableNode>,
    edges: Vec<ForeignKeyEdge>,
    schema_statements: Vec<String>,
}

#[derive(Default)]
struct MemoryState {
    data: GraphData,
    sessions_opened: usize,
    sessions_committed: usize,
    open_sessions: usize,
    unavailable: Option<String>,
    rejected: Option<String>,
}

/// Shared in-memory graph. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryGraph {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `session()` fail until cleared.
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.lock().unavailable = reason.map(str::to_string);
    }

    /// Make every table or foreign-key statement fail until cleared.
    pub fn set_rejecting(&self, reason: Option<&str>) {
        self.lock().rejected = reason.map(str::to_string);
    }

    /// Insert a table node directly, bypassing sessions.
    pub fn seed_table(&self, table: &TableInfo) {
        upsert_table(&mut self.lock().data, table);
    }

    pub fn tables(&self) -> Vec<TableNode> {
        self.lock().data.nodes.clone()
    }

    pub fn foreign_keys(&self) -> Vec<ForeignKeyEdge> {
        self.lock().data.edges.clone()
    }

    pub fn schema_statements(&self) -> Vec<String> {
        self.lock().data.schema_statements.clone()
    }

    /// Sessions handed out so far.
    pub fn sessions_opened(&self) -> usize {
        self.lock().sessions_opened
    }

    /// Sessions whose writes were committed.
    pub fn sessions_committed(&self) -> usize {
        self.lock().sessions_committed
    }

    /// Sessions handed out and not yet dropped.
    pub fn open_sessions(&self) -> usize {
        self.lock().open_sessions
    }

    /// Per-database node and relationship counts, ordered by database.
    pub fn schema_counts(&self) -> Vec<DatabaseCounts> {
        let state = self.lock();
        let mut counts: Vec<DatabaseCounts> = Vec::new();
        for node in &state.data.nodes {
            entry(&mut counts, &node.database).tables += 1;
        }
        for edge in &state.data.edges {
            entry(&mut counts, &edge.database).foreign_keys += 1;
        }
        counts.sort_by(|a, b| a.database.cmp(&b.database));
        counts
    }
}

fn entry<'a>(counts: &'a mut Vec<DatabaseCounts>, database: &str) -> &'a mut DatabaseCounts {
    match counts.iter().position(|c| c.database == database) {
        Some(idx) => &mut counts[idx],
        None => {
            counts.push(DatabaseCounts {
                database: database.to_string(),
                tables: 0,
                foreign_keys: 0,
            });
            let last = counts.len() - 1;
            &mut counts[last]
        }
    }
}

fn upsert_table(data: &mut GraphData, table: &TableInfo) -> i64 {
    let now = Utc::now();
    match data
        .nodes
        .iter_mut()
        .find(|n| n.name == table.table_name && n.database == table.database_name)
    {
        Some(node) => {
            node.schema = table.schema_name.clone();
            node.updated_at = now;
        }
        None => data.nodes.push(TableNode {
            name: table.table_name.clone(),
            database: table.database_name.clone(),
            schema: table.schema_name.clone(),
            updated_at: now,
        }),
    }
    1
}

fn link_foreign_key(data: &mut GraphData, fk: &ForeignKeyInfo) -> i64 {
    let has_node = |name: &str| {
        data
            .nodes
            .iter()
            .any(|n| n.name == name && n.database == fk.database_name)
    };
    if !has_node(&fk.source_table) || !has_node(&fk.target_table) {
        return 0;
    }

    let now = Utc::now();
    match data.edges.iter_mut().find(|e| {
        e.source_table == fk.source_table
            && e.target_table == fk.target_table
            && e.constraint_name == fk.constraint_name
            && e.source_column == fk.source_column
            && e.target_column == fk.target_column
            && e.database == fk.database_name
    }) {
        Some(edge) => edge.updated_at = now,
        None => data.edges.push(ForeignKeyEdge {
            source_table: fk.source_table.clone(),
            target_table: fk.target_table.clone(),
            constraint_name: fk.constraint_name.clone(),
            source_column: fk.source_column.clone(),
            target_column: fk.target_column.clone(),
            database: fk.database_name.clone(),
            updated_at: now,
        }),
    }
    1
}

/// Session over a [`MemoryGraph`].
pub struct MemorySession {
    state: Arc<Mutex<MemoryState>>,
    staged: GraphData,
}

impl MemorySession {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    type Session = MemorySession;

    async fn session(&self) -> GraphResult<MemorySession> {
        let mut state = self.lock();
        if let Some(reason) = &state.unavailable {
            return Err(GraphError::Unavailable(reason.clone()));
        }
        state.sessions_opened += 1;
        state.open_sessions += 1;
        Ok(MemorySession {
            state: Arc::clone(&self.state),
            staged: state.data.clone(),
        })
    }
}

#[async_trait]
impl GraphSession for MemorySession {
    async fn run(&mut self, statement: &GraphStatement<'_>) -> GraphResult<StatementOutcome> {
        if let GraphStatement::Schema(cypher) = statement {
            self.staged.schema_statements.push(cypher.to_string());
            return Ok(StatementOutcome::default());
        }
        if let Some(reason) = self.lock().rejected.clone() {
            return Err(GraphError::Rejected(format!("{}: {}", statement.kind(), reason)));
        }

        let affected = match statement {
            GraphStatement::UpsertTable(table) => upsert_table(&mut self.staged, table),
            GraphStatement::LinkForeignKey(fk) => link_foreign_key(&mut self.staged, fk),
            GraphStatement::Schema(_) => 0,
        };
        Ok(StatementOutcome { affected })
    }

    async fn commit(mut self) -> GraphResult<()> {
        let staged = std::mem::take(&mut self.staged);
        let mut state = self.lock();
        state.data = staged;
        state.sessions_committed += 1;
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let mut state = self.lock();
        state.open_sessions = state.open_sessions.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fk(database: &str, source: &str, target: &str) -> ForeignKeyInfo {
        ForeignKeyInfo {
            database_name: database.to_string(),
            constraint_name: format!("fk_{}_{}", source, target),
            source_table: source.to_string(),
            source_column: format!("{}_id", target),
            target_table: target.to_string(),
            target_column: "id".to_string(),
        }
    }

    #[tokio::test]
    async fn test_table_upsert_matches_on_name_and_database() {
        let graph = MemoryGraph::new();
        let mut session = graph.session().await.unwrap();

        let a = TableInfo::new("orders_db", "public", "items");
        let b = TableInfo::new("products_db", "public", "items");
        let a_moved = TableInfo::new("orders_db", "archive", "items");

        session.run(&GraphStatement::UpsertTable(&a)).await.unwrap();
        session.run(&GraphStatement::UpsertTable(&b)).await.unwrap();
        session.run(&GraphStatement::UpsertTable(&a_moved)).await.unwrap();
        session.commit().await.unwrap();

        let nodes = graph.tables();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].schema, "archive");
    }

    #[tokio::test]
    async fn test_uncommitted_session_discards_writes() {
        let graph = MemoryGraph::new();
        graph.seed_table(&TableInfo::new("orders_db", "public", "orders"));

        {
            let mut session = graph.session().await.unwrap();
            let customers = TableInfo::new("orders_db", "public", "customers");
            session.run(&GraphStatement::UpsertTable(&customers)).await.unwrap();
            session
                .run(&GraphStatement::LinkForeignKey(&fk("orders_db", "orders", "customers")))
                .await
                .unwrap();
            assert_eq!(graph.tables().len(), 1);
        }

        assert_eq!(graph.tables().len(), 1);
        assert!(graph.foreign_keys().is_empty());
        assert_eq!(graph.sessions_committed(), 0);
        assert_eq!(graph.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_link_requires_both_endpoints() {
        let graph = MemoryGraph::new();
        graph.seed_table(&TableInfo::new("orders_db", "public", "orders"));
        let mut session = graph.session().await.unwrap();

        let outcome = session
            .run(&GraphStatement::LinkForeignKey(&fk("orders_db", "orders", "customers")))
            .await
            .unwrap();
        assert_eq!(outcome.affected, 0);
        assert!(graph.foreign_keys().is_empty());
    }

    #[tokio::test]
    async fn test_session_release_is_tracked() {
        let graph = MemoryGraph::new();
        {
            let _first = graph.session().await.unwrap();
            let _second = graph.session().await.unwrap();
            assert_eq!(graph.open_sessions(), 2);
        }
        assert_eq!(graph.open_sessions(), 0);
        assert_eq!(graph.sessions_opened(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_and_rejecting() {
        let graph = MemoryGraph::new();
        graph.set_unavailable(Some("bolt handshake failed"));
        assert!(matches!(graph.session().await, Err(GraphError::Unavailable(_))));

        graph.set_unavailable(None);
        graph.set_rejecting(Some("read-only replica"));
        let mut session = graph.session().await.unwrap();
        let table = TableInfo::new("orders_db", "public", "orders");
        let err = session.run(&GraphStatement::UpsertTable(&table)).await.unwrap_err();
        assert!(err.to_string().contains("upsert_table: read-only replica"));

        session.run(&GraphStatement::Schema("CREATE INDEX")).await.unwrap();
        session.commit().await.unwrap();
        assert_eq!(graph.schema_statements(), vec!["CREATE INDEX".to_string()]);
    }

    #[test]
    fn test_schema_counts() {
        let graph = MemoryGraph::new();
        graph.seed_table(&TableInfo::new("products_db", "public", "products"));
        graph.seed_table(&TableInfo::new("orders_db", "public", "orders"));
        graph.seed_table(&TableInfo::new("orders_db", "public", "customers"));
        link_foreign_key(&mut graph.lock().data, &fk("orders_db", "orders", "customers"));

        let counts = graph.schema_counts();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0], DatabaseCounts { database: "orders_db".to_string(), tables: 2, foreign_keys: 1 });
        assert_eq!(counts[1], DatabaseCounts { database: "products_db".to_string(), tables: 1, foreign_keys: 0 });
    }
}
