//! Read-only query executors bound to one logical database.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};
use tracing::debug;

use dbmatrix_core::DatabaseConfig;

use crate::error::{CatalogError, CatalogResult};

/// One catalog row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    values: HashMap<String, String>,
}

impl CatalogRow {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Text value of `column`.
    pub fn get(&self, column: &str) -> Result<&str, sqlx::Error> {
        self.values
            .get(column)
            .map(String::as_str)
            .ok_or_else(|| sqlx::Error::ColumnNotFound(column.to_string()))
    }
}

/// Executes a read-only catalog query and returns the requested columns as text.
///
/// Each executor is scoped to a single logical database, so rows never carry
/// the logical identifier themselves.
#[async_trait]
pub trait CatalogExecutor: Send + Sync {
    async fn fetch_rows(&self, sql: &str, columns: &[&str]) -> Result<Vec<CatalogRow>, sqlx::Error>;

    /// Release pooled connections. Called once at shutdown.
    async fn close(&self) {}
}

/// PostgreSQL executor backed by a lazily connecting sqlx pool.
#[derive(Clone)]
pub struct PgExecutor {
    database: String,
    pool: PgPool,
}

impl PgExecutor {
    /// Build the pool for `config` without opening a connection yet.
    ///
    /// A database that is down at startup only fails the cycles that touch
    /// it; connections are established on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> CatalogResult<Self> {
        let options = PgConnectOptions::from_str(&config.url).map_err(|source| CatalogError::Connect {
            database: config.name.clone(),
            source,
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy_with(options);

        debug!(database = %config.name, url = %config.redacted_url(), "Created catalog pool");

        Ok(Self {
            database: config.name.clone(),
            pool,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

#[async_trait]
impl CatalogExecutor for PgExecutor {
    async fn fetch_rows(&self, sql: &str, columns: &[&str]) -> Result<Vec<CatalogRow>, sqlx::Error> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                let mut values = HashMap::with_capacity(columns.len());
                for column in columns {
                    let value: String = row.try_get(*column)?;
                    values.insert(column.to_string(), value);
                }
                Ok(CatalogRow { values })
            })
            .collect()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup() {
        let row = CatalogRow::from_pairs([("table_schema", "public"), ("table_name", "orders")]);
        assert_eq!(row.get("table_name").unwrap(), "orders");
        assert!(matches!(
            row.get("constraint_name"),
            Err(sqlx::Error::ColumnNotFound(col)) if col == "constraint_name"
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let config = DatabaseConfig::new("orders_db", "::not a url::");
        let err = PgExecutor::connect_lazy(&config).err().unwrap();
        assert!(matches!(err, CatalogError::Connect { ref database, .. } if database == "orders_db"));
    }

    #[tokio::test]
    async fn test_lazy_pool_does_not_connect() {
        let config = DatabaseConfig::new("orders_db", "postgres://app:pw@127.0.0.1:1/orders");
        let executor = PgExecutor::connect_lazy(&config).unwrap();
        assert_eq!(executor.database(), "orders_db");
    }
}
