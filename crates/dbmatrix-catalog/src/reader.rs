//! Table and foreign-key discovery over `information_schema`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use dbmatrix_core::{ForeignKeyInfo, PipelineConfig, TableInfo};

use crate::error::{CatalogError, CatalogResult};
use crate::executor::{CatalogExecutor, CatalogRow, PgExecutor};

/// Base tables of the public schema, ordered by name.
pub const TABLES_SQL: &str = "SELECT table_schema, table_name
FROM information_schema.tables
WHERE table_schema = 'public'
AND table_type = 'BASE TABLE'
ORDER BY table_name";

const TABLE_COLUMNS: &[&str] = &["table_schema", "table_name"];

/// Column-level foreign keys of the public schema, ordered by table then constraint.
pub const FOREIGN_KEYS_SQL: &str = "SELECT
    tc.constraint_name,
    tc.table_name AS source_table,
    kcu.column_name AS source_column,
    ccu.table_name AS target_table,
    ccu.column_name AS target_column
FROM information_schema.table_constraints AS tc
JOIN information_schema.key_column_usage AS kcu
    ON tc.constraint_name = kcu.constraint_name
    AND tc.table_schema = kcu.table_schema
JOIN information_schema.constraint_column_usage AS ccu
    ON ccu.constraint_name = tc.constraint_name
    AND ccu.table_schema = tc.table_schema
WHERE tc.constraint_type = 'FOREIGN KEY'
AND tc.table_schema = 'public'
ORDER BY tc.table_name, tc.constraint_name";

const FOREIGN_KEY_COLUMNS: &[&str] = &[
    "constraint_name",
    "source_table",
    "source_column",
    "target_table",
    "target_column",
];

/// Discovers schema metadata for a fixed set of logical databases.
///
/// Each logical identifier maps to exactly one executor. Lookups for any
/// other identifier fail with [`CatalogError::UnknownDatabase`] before a
/// query is issued.
#[derive(Clone, Default)]
pub struct CatalogReader {
    executors: HashMap<String, Arc<dyn CatalogExecutor>>,
    order: Vec<String>,
}

impl CatalogReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a reader with one lazily connecting PostgreSQL pool per configured database.
    pub fn from_config(config: &PipelineConfig) -> CatalogResult<Self> {
        let mut reader = Self::new();
        for db in &config.databases {
            let executor = PgExecutor::connect_lazy(db)?;
            reader = reader.with_executor(db.name.clone(), Arc::new(executor));
        }
        Ok(reader)
    }

    /// Bind `database` to `executor`. Re-registering a name replaces its executor
    /// but keeps its original position.
    pub fn with_executor(mut self, database: impl Into<String>, executor: Arc<dyn CatalogExecutor>) -> Self {
        let database = database.into();
        if self.executors.insert(database.clone(), executor).is_none() {
            self.order.push(database);
        }
        self
    }

    /// Configured logical databases in registration order.
    pub fn databases(&self) -> &[String] {
        &self.order
    }

    fn executor(&self, database: &str) -> CatalogResult<&Arc<dyn CatalogExecutor>> {
        self.executors
            .get(database)
            .ok_or_else(|| CatalogError::UnknownDatabase(database.to_string()))
    }

    async fn fetch(&self, database: &str, sql: &str, columns: &[&str]) -> CatalogResult<Vec<CatalogRow>> {
        let executor = self.executor(database)?;
        executor
            .fetch_rows(sql, columns)
            .await
            .map_err(|source| CatalogError::QueryExecution {
                database: database.to_string(),
                source,
            })
    }

    /// List base tables in the public schema of `database`.
    pub async fn discover_tables(&self, database: &str) -> CatalogResult<Vec<TableInfo>> {
        let rows = self.fetch(database, TABLES_SQL, TABLE_COLUMNS).await?;

        let tables = rows
            .iter()
            .map(|row| {
                Ok(TableInfo {
                    database_name: database.to_string(),
                    schema_name: row.get("table_schema")?.to_string(),
                    table_name: row.get("table_name")?.to_string(),
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|source| CatalogError::QueryExecution {
                database: database.to_string(),
                source,
            })?;

        debug!(database, count = tables.len(), "Discovered tables");
        Ok(tables)
    }

    /// List foreign-key constraints in the public schema of `database`.
    pub async fn discover_foreign_keys(&self, database: &str) -> CatalogResult<Vec<ForeignKeyInfo>> {
        let rows = self.fetch(database, FOREIGN_KEYS_SQL, FOREIGN_KEY_COLUMNS).await?;

        let foreign_keys = rows
            .iter()
            .map(|row| {
                Ok(ForeignKeyInfo {
                    database_name: database.to_string(),
                    constraint_name: row.get("constraint_name")?.to_string(),
                    source_table: row.get("source_table")?.to_string(),
                    source_column: row.get("source_column")?.to_string(),
                    target_table: row.get("target_table")?.to_string(),
                    target_column: row.get("target_column")?.to_string(),
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|source| CatalogError::QueryExecution {
                database: database.to_string(),
                source,
            })?;

        debug!(database, count = foreign_keys.len(), "Discovered foreign keys");
        Ok(foreign_keys)
    }

    /// Close every executor's connections.
    pub async fn close(&self) {
        for name in &self.order {
            if let Some(executor) = self.executors.get(name) {
                executor.close().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::StaticExecutor;

    fn orders_executor() -> Arc<StaticExecutor> {
        Arc::new(
            StaticExecutor::new()
                .with_table("public", "customers")
                .with_table("public", "orders")
                .with_foreign_key("fk_orders_customer", "orders", "customer_id", "customers", "id"),
        )
    }

    #[tokio::test]
    async fn test_discover_tables_sets_database() {
        let reader = CatalogReader::new().with_executor("orders_db", orders_executor());

        let tables = reader.discover_tables("orders_db").await.unwrap();
        assert_eq!(
            tables,
            vec![
                TableInfo::new("orders_db", "public", "customers"),
                TableInfo::new("orders_db", "public", "orders"),
            ]
        );
    }

    #[tokio::test]
    async fn test_discover_foreign_keys() {
        let reader = CatalogReader::new().with_executor("orders_db", orders_executor());

        let fks = reader.discover_foreign_keys("orders_db").await.unwrap();
        assert_eq!(fks.len(), 1);
        let fk = &fks[0];
        assert_eq!(fk.database_name, "orders_db");
        assert_eq!(fk.constraint_name, "fk_orders_customer");
        assert_eq!(fk.source_table, "orders");
        assert_eq!(fk.source_column, "customer_id");
        assert_eq!(fk.target_table, "customers");
        assert_eq!(fk.target_column, "id");
    }

    #[tokio::test]
    async fn test_unknown_database_issues_no_query() {
        let executor = orders_executor();
        let reader = CatalogReader::new().with_executor("orders_db", executor.clone());

        let err = reader.discover_tables("nonexistent_db").await.unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDatabase(ref name) if name == "nonexistent_db"));

        let err = reader.discover_foreign_keys("nonexistent_db").await.unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDatabase(_)));

        assert_eq!(executor.query_count(), 0);
    }

    #[tokio::test]
    async fn test_executor_failure_is_wrapped() {
        let executor = orders_executor();
        executor.fail_with("connection refused");
        let reader = CatalogReader::new().with_executor("orders_db", executor.clone());

        let err = reader.discover_tables("orders_db").await.unwrap_err();
        match err {
            CatalogError::QueryExecution { database, source } => {
                assert_eq!(database, "orders_db");
                assert!(source.to_string().contains("connection refused"));
            }
            other => panic!("unexpected error: {other}"),
        }

        executor.clear_failure();
        assert_eq!(reader.discover_tables("orders_db").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_column_is_a_query_error() {
        let executor = Arc::new(
            StaticExecutor::new().with_table_row(CatalogRow::from_pairs([("table_name", "orders")])),
        );
        let reader = CatalogReader::new().with_executor("orders_db", executor);

        let err = reader.discover_tables("orders_db").await.unwrap_err();
        assert!(matches!(err, CatalogError::QueryExecution { .. }));
        assert_eq!(err.database(), "orders_db");
    }

    #[tokio::test]
    async fn test_databases_keep_registration_order() {
        let reader = CatalogReader::new()
            .with_executor("products_db", Arc::new(StaticExecutor::new()))
            .with_executor("orders_db", Arc::new(StaticExecutor::new()))
            .with_executor("products_db", orders_executor());

        assert_eq!(reader.databases(), ["products_db", "orders_db"]);
        assert_eq!(reader.discover_tables("products_db").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_from_config_registers_every_database() {
        let config = PipelineConfig::default();
        let reader = CatalogReader::from_config(&config).unwrap();
        assert_eq!(reader.databases(), ["orders_db", "products_db"]);
    }
}
