//! Catalog discovery error types.

use thiserror::Error;

/// Errors raised by catalog discovery.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Unknown database: {0}")]
    UnknownDatabase(String),

    #[error("Catalog query failed for {database}: {source}")]
    QueryExecution {
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid connection settings for {database}: {source}")]
    Connect {
        database: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    /// Logical database the error refers to.
    pub fn database(&self) -> &str {
        match self {
            Self::UnknownDatabase(name) => name,
            Self::QueryExecution { database, .. } | Self::Connect { database, .. } => database,
        }
    }
}
