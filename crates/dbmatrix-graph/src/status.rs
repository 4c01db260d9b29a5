//! Graph status queries.

use neo4rs::Query;
use serde::Serialize;

use crate::client::{read_field, GraphClient};
use crate::store::GraphResult;

/// Table nodes and foreign-key relationships recorded for one logical database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseCounts {
    pub database: String,
    pub tables: usize,
    pub foreign_keys: usize,
}

const COUNTS_CYPHER: &str = "MATCH (t:Table)
OPTIONAL MATCH (t)-[r:HAS_FOREIGN_KEY]->(:Table)
RETURN t.database AS database,
       count(DISTINCT t) AS tables,
       count(r) AS foreign_keys
ORDER BY database";

impl GraphClient {
    /// Per-database node and relationship counts, ordered by database.
    pub async fn schema_counts(&self) -> GraphResult<Vec<DatabaseCounts>> {
        let rows = self.query(Query::new(COUNTS_CYPHER.to_string())).await?;

        rows.iter()
            .map(|row| {
                let tables: i64 = read_field(row, "tables")?;
                let foreign_keys: i64 = read_field(row, "foreign_keys")?;
                Ok(DatabaseCounts {
                    database: read_field(row, "database")?,
                    tables: tables as usize,
                    foreign_keys: foreign_keys as usize,
                })
            })
            .collect()
    }

    /// Timestamp of the most recent table refresh, if any table has been synced.
    pub async fn last_synced_at(&self) -> GraphResult<Option<String>> {
        let query = Query::new(
            "MATCH (t:Table) RETURN toString(max(t.updatedAt)) AS last_synced".to_string(),
        );
        Ok(self.query_scalar::<Option<String>>(query, "last_synced").await?.flatten())
    }
}
