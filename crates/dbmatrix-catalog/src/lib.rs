//! # DBMatrix Catalog
//!
//! Reads base tables and foreign-key constraints from the `information_schema`
//! of each configured PostgreSQL database.

pub mod error;
pub mod executor;
pub mod memory;
pub mod reader;

pub use error::{CatalogError, CatalogResult};
pub use executor::{CatalogExecutor, CatalogRow, PgExecutor};
pub use memory::StaticExecutor;
pub use reader::{CatalogReader, FOREIGN_KEYS_SQL, TABLES_SQL};
