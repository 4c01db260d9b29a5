//! One sync cycle: discover every database, then write once.
//!
//! Discovery runs database by database in configuration order. The graph is
//! only written after every database has been discovered, so a failure in any
//! discovery skips the whole write for that cycle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use dbmatrix_catalog::CatalogReader;
use dbmatrix_core::{ForeignKeyInfo, SyncSettings, TableInfo};
use dbmatrix_graph::{GraphStore, SchemaWriter, SyncReport};

use crate::error::{CycleError, DiscoveryStage};

/// Whether a cycle is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Running,
}

/// Discovery counts for one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseDiscovery {
    pub database: String,
    pub tables: usize,
    pub foreign_keys: usize,
}

/// Summary of a successful cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub databases: Vec<DatabaseDiscovery>,
    pub tables: usize,
    pub foreign_keys: usize,
    pub sync: SyncReport,
}

/// Result of one tick, after containment.
#[derive(Debug)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Failed(CycleError),
    /// Another cycle was still running.
    Skipped,
}

impl CycleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Counters kept across cycles, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    pub skipped: u64,
}

#[derive(Default)]
struct Counters {
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

/// Drives discovery and the graph write for one cycle at a time.
pub struct SyncOrchestrator<S> {
    reader: CatalogReader,
    writer: SchemaWriter<S>,
    cycle_timeout: Option<Duration>,
    running: AtomicBool,
    counters: Counters,
}

/// Resets the running flag however the cycle ends, including cancellation.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: GraphStore> SyncOrchestrator<S> {
    pub fn new(reader: CatalogReader, writer: SchemaWriter<S>, settings: &SyncSettings) -> Self {
        Self {
            reader,
            writer,
            cycle_timeout: settings.cycle_timeout(),
            running: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    pub fn reader(&self) -> &CatalogReader {
        &self.reader
    }

    pub fn writer(&self) -> &SchemaWriter<S> {
        &self.writer
    }

    pub fn state(&self) -> CycleState {
        if self.running.load(Ordering::Acquire) {
            CycleState::Running
        } else {
            CycleState::Idle
        }
    }

    pub fn stats(&self) -> CycleStats {
        CycleStats {
            started: self.counters.started.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
        }
    }

    /// Run one cycle and contain any failure.
    ///
    /// Errors are logged here and never propagate. A call made while another
    /// cycle is running does nothing and returns [`CycleOutcome::Skipped`].
    pub async fn tick(&self) -> CycleOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            warn!("Previous schema sync still running, skipping this tick");
            return CycleOutcome::Skipped;
        }
        let _guard = RunningGuard(&self.running);

        let cycle_id = Uuid::new_v4();
        self.counters.started.fetch_add(1, Ordering::Relaxed);

        let span = info_span!("sync_cycle", cycle_id = %cycle_id);
        async {
            let result = match self.cycle_timeout {
                Some(limit) => match tokio::time::timeout(limit, self.run_cycle(cycle_id)).await {
                    Ok(result) => result,
                    Err(_) => Err(CycleError::TimedOut(limit)),
                },
                None => self.run_cycle(cycle_id).await,
            };
            self.contain(result)
        }
        .instrument(span)
        .await
    }

    fn contain(&self, result: Result<CycleReport, CycleError>) -> CycleOutcome {
        match result {
            Ok(report) => {
                self.counters.completed.fetch_add(1, Ordering::Relaxed);
                info!(
                    tables = report.tables,
                    foreign_keys = report.foreign_keys,
                    linked = report.sync.foreign_keys_linked,
                    skipped = report.sync.foreign_keys_skipped,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Schema sync completed successfully"
                );
                CycleOutcome::Completed(report)
            }
            Err(err) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    phase = err.phase(),
                    database = err.database().unwrap_or("-"),
                    error = %err,
                    failed_cycles = self.counters.failed.load(Ordering::Relaxed),
                    "Schema sync cycle failed, graph left unchanged for this cycle"
                );
                CycleOutcome::Failed(err)
            }
        }
    }

    /// Discover every configured database, then write the combined schema.
    ///
    /// Errors propagate; [`SyncOrchestrator::tick`] is the containment point.
    pub async fn run_cycle(&self, cycle_id: Uuid) -> Result<CycleReport, CycleError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        info!(%cycle_id, databases = self.reader.databases().len(), "Starting scheduled schema sync for all databases");

        let mut all_tables: Vec<TableInfo> = Vec::new();
        let mut all_foreign_keys: Vec<ForeignKeyInfo> = Vec::new();
        let mut databases = Vec::with_capacity(self.reader.databases().len());

        for database in self.reader.databases() {
            info!(database = %database, "Syncing database");

            let tables = self
                .reader
                .discover_tables(database)
                .await
                .map_err(|source| CycleError::Discovery {
                    database: database.clone(),
                    stage: DiscoveryStage::Tables,
                    source,
                })?;
            let foreign_keys = self
                .reader
                .discover_foreign_keys(database)
                .await
                .map_err(|source| CycleError::Discovery {
                    database: database.clone(),
                    stage: DiscoveryStage::ForeignKeys,
                    source,
                })?;

            info!(
                database = %database,
                tables = tables.len(),
                foreign_keys = foreign_keys.len(),
                "Discovered schema"
            );
            databases.push(DatabaseDiscovery {
                database: database.clone(),
                tables: tables.len(),
                foreign_keys: foreign_keys.len(),
            });
            all_tables.extend(tables);
            all_foreign_keys.extend(foreign_keys);
        }

        let sync = self.writer.sync_schema(&all_tables, &all_foreign_keys).await?;

        Ok(CycleReport {
            cycle_id,
            started_at,
            elapsed: clock.elapsed(),
            databases,
            tables: all_tables.len(),
            foreign_keys: all_foreign_keys.len(),
            sync,
        })
    }
}
