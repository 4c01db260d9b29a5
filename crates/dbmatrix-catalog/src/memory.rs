//! In-memory catalog executor with canned rows.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::executor::{CatalogExecutor, CatalogRow};
use crate::reader::{FOREIGN_KEYS_SQL, TABLES_SQL};

/// Answers the two catalog queries from seeded rows.
///
/// A failure can be injected with [`StaticExecutor::fail_with`]; while set,
/// every query returns a protocol error carrying that message.
#[derive(Default)]
pub struct StaticExecutor {
    tables: Vec<CatalogRow>,
    foreign_keys: Vec<CatalogRow>,
    failure: Mutex<Option<String>>,
    queries: AtomicUsize,
}

impl StaticExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, schema: &str, table: &str) -> Self {
        self.with_table_row(CatalogRow::from_pairs([
            ("table_schema", schema),
            ("table_name", table),
        ]))
    }

    pub fn with_table_row(mut self, row: CatalogRow) -> Self {
        self.tables.push(row);
        self
    }

    pub fn with_foreign_key(
        mut self,
        constraint: &str,
        source_table: &str,
        source_column: &str,
        target_table: &str,
        target_column: &str,
    ) -> Self {
        self.foreign_keys.push(CatalogRow::from_pairs([
            ("constraint_name", constraint),
            ("source_table", source_table),
            ("source_column", source_column),
            ("target_table", target_table),
            ("target_column", target_column),
        ]));
        self
    }

    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }

    pub fn clear_failure(&self) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Number of queries received, including failed ones.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogExecutor for StaticExecutor {
    async fn fetch_rows(&self, sql: &str, _columns: &[&str]) -> Result<Vec<CatalogRow>, sqlx::Error> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let failure = self.failure.lock().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(message) = failure {
            return Err(sqlx::Error::Protocol(message));
        }

        if sql == TABLES_SQL {
            Ok(self.tables.clone())
        } else if sql == FOREIGN_KEYS_SQL {
            Ok(self.foreign_keys.clone())
        } else {
            Err(sqlx::Error::Protocol(format!("unsupported catalog query: {}", sql)))
        }
    }
}
