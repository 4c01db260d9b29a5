//! Sync cycle error types.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use dbmatrix_catalog::CatalogError;
use dbmatrix_graph::GraphSyncError;

/// Catalog query that failed during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStage {
    Tables,
    ForeignKeys,
}

impl fmt::Display for DiscoveryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tables => f.write_str("tables"),
            Self::ForeignKeys => f.write_str("foreign keys"),
        }
    }
}

/// Why a sync cycle ended early.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Discovery of {stage} failed for {database}: {source}")]
    Discovery {
        database: String,
        stage: DiscoveryStage,
        #[source]
        source: CatalogError,
    },

    #[error(transparent)]
    Write(#[from] GraphSyncError),

    #[error("Sync cycle exceeded timeout of {0:?}")]
    TimedOut(Duration),
}

impl CycleError {
    /// Phase of the cycle that failed.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Discovery { .. } => "discovery",
            Self::Write(_) => "write",
            Self::TimedOut(_) => "timeout",
        }
    }

    /// Database being discovered when the cycle failed, if any.
    pub fn database(&self) -> Option<&str> {
        match self {
            Self::Discovery { database, .. } => Some(database),
            _ => None,
        }
    }
}
