//! # DBMatrix Sync
//!
//! Runs schema discovery for every configured database and writes the
//! combined result to the graph, once per scheduler tick.

pub mod error;
pub mod orchestrator;
pub mod scheduler;

pub use error::{CycleError, DiscoveryStage};
pub use orchestrator::{
    CycleOutcome, CycleReport, CycleState, CycleStats, DatabaseDiscovery, SyncOrchestrator,
};
pub use scheduler::Scheduler;
