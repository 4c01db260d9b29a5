//! # DBMatrix Graph
//!
//! Projects discovered relational schema into Neo4j.
//!
//! Tables become `(:Table {name, database})` nodes and foreign keys become
//! `[:HAS_FOREIGN_KEY]` relationships between tables of the same database.
//! All writes are `MERGE`-based so repeated syncs never duplicate entities.

pub mod client;
pub mod memory;
pub mod schema;
pub mod status;
pub mod store;
pub mod sync;

pub use client::{GraphClient, Neo4jSession};
pub use memory::{ForeignKeyEdge, MemoryGraph, TableNode};
pub use status::DatabaseCounts;
pub use store::{GraphError, GraphResult, GraphSession, GraphStatement, GraphStore, StatementOutcome};
pub use sync::{GraphSyncError, SchemaWriter, SyncReport, WritePhase};
