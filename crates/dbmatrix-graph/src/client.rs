//! Neo4j connection client.

use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query, Txn};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use dbmatrix_core::GraphSettings;

use crate::store::{GraphError, GraphResult, GraphSession, GraphStatement, GraphStore, StatementOutcome};

/// Client for Neo4j schema graph operations.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Build the connection pool without contacting the server.
    ///
    /// neo4rs uses a lazy pool, so an unreachable server only surfaces when
    /// the first statement or session runs.
    pub async fn open(settings: &GraphSettings) -> GraphResult<Self> {
        let config = ConfigBuilder::default()
            .uri(&settings.uri)
            .user(&settings.user)
            .password(&settings.password)
            .db(settings.database.as_str())
            .max_connections(settings.max_connections)
            .fetch_size(settings.fetch_size)
            .build()?;

        let graph = Graph::connect(config).await?;
        Ok(Self { graph })
    }

    /// Create a new GraphClient and verify the server answers.
    ///
    /// The `RETURN 1` ping forces a real bolt handshake so an unreachable
    /// server fails here instead of on first use.
    pub async fn connect(settings: &GraphSettings) -> GraphResult<Self> {
        let client = Self::open(settings).await?;
        client.execute(Query::new("RETURN 1".to_string())).await?;

        debug!(uri = %settings.uri, database = %settings.database, "Connected to Neo4j");
        Ok(client)
    }

    /// Execute a Cypher query that returns no results.
    pub async fn execute(&self, query: Query) -> GraphResult<()> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a Cypher query and return results as rows.
    pub async fn query(&self, query: Query) -> GraphResult<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(query).await?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a Cypher query and return a single scalar value.
    pub async fn query_scalar<T: DeserializeOwned>(&self, query: Query, field: &str) -> GraphResult<Option<T>> {
        let rows = self.query(query).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(read_field(&row, field)?)),
            None => Ok(None),
        }
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}

pub(crate) fn read_field<T: DeserializeOwned>(row: &neo4rs::Row, field: &str) -> GraphResult<T> {
    row.get(field).map_err(|e| GraphError::Decode {
        field: field.to_string(),
        message: format!("{:?}", e),
    })
}

/// One Neo4j unit of work, backed by an explicit transaction.
///
/// The transaction pins a single pooled connection for the lifetime of the
/// session. Dropping the session without `commit` returns that connection to
/// the pool, where it is reset and the open transaction rolled back.
pub struct Neo4jSession {
    txn: Option<Txn>,
    id: Uuid,
    statements: usize,
}

impl Neo4jSession {
    fn txn(&mut self) -> GraphResult<&mut Txn> {
        self.txn
            .as_mut()
            .ok_or_else(|| GraphError::Rejected("session already committed".to_string()))
    }
}

#[async_trait]
impl GraphStore for GraphClient {
    type Session = Neo4jSession;

    async fn session(&self) -> GraphResult<Neo4jSession> {
        let txn = self
            .graph
            .start_txn()
            .await
            .map_err(|e| GraphError::Unavailable(e.to_string()))?;

        let session = Neo4jSession {
            txn: Some(txn),
            id: Uuid::new_v4(),
            statements: 0,
        };
        debug!(session = %session.id, "Opened graph session");
        Ok(session)
    }
}

#[async_trait]
impl GraphSession for Neo4jSession {
    async fn run(&mut self, statement: &GraphStatement<'_>) -> GraphResult<StatementOutcome> {
        self.statements += 1;
        let txn = self.txn()?;

        if let GraphStatement::Schema(_) = statement {
            txn.run(statement.to_query()).await?;
            return Ok(StatementOutcome::default());
        }

        let mut stream = txn.execute(statement.to_query()).await?;
        let mut affected = 0;
        while let Some(row) = stream.next(txn.handle()).await? {
            affected = read_field::<i64>(&row, "affected")?;
        }
        Ok(StatementOutcome { affected })
    }

    async fn commit(mut self) -> GraphResult<()> {
        if let Some(txn) = self.txn.take() {
            txn.commit().await?;
            debug!(session = %self.id, statements = self.statements, "Committed graph session");
        }
        Ok(())
    }
}

impl Drop for Neo4jSession {
    fn drop(&mut self) {
        if self.txn.is_some() {
            debug!(session = %self.id, statements = self.statements, "Rolled back graph session");
        }
    }
}
