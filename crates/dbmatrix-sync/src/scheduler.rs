//! Fixed-rate scheduling of sync cycles.
//!
//! Ticks are spaced one interval apart, measured from tick start to tick
//! start. Cycles never overlap: the loop awaits each cycle before waiting on
//! the next tick. A tick that comes due while a cycle is running is delivered
//! as soon as that cycle ends; any further ticks missed meanwhile are dropped
//! ([`MissedTickBehavior::Skip`]) and the schedule stays aligned to the
//! original start.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

use dbmatrix_core::{SyncSettings, MAX_INTERVAL_SECS};
use dbmatrix_graph::GraphStore;

use crate::orchestrator::SyncOrchestrator;

/// Periodic driver for a [`SyncOrchestrator`].
pub struct Scheduler<S> {
    orchestrator: Arc<SyncOrchestrator<S>>,
    interval: Duration,
    run_on_start: bool,
}

impl<S: GraphStore> Scheduler<S> {
    pub fn new(orchestrator: Arc<SyncOrchestrator<S>>, settings: &SyncSettings) -> Self {
        Self {
            orchestrator,
            interval: settings.interval().min(Duration::from_secs(MAX_INTERVAL_SECS)),
            run_on_start: settings.run_on_start,
        }
    }

    pub fn orchestrator(&self) -> &Arc<SyncOrchestrator<S>> {
        &self.orchestrator
    }

    /// Run cycles until `shutdown` resolves. Returns the number of ticks handled.
    ///
    /// Shutdown is honoured between cycles and also abandons an in-flight
    /// cycle; an abandoned cycle never reaches its graph write or is cut off
    /// between two upsert statements.
    pub async fn run_until<F>(self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let now = Instant::now();
        let first = if self.run_on_start {
            now
        } else {
            now.checked_add(self.interval).unwrap_or(now)
        };
        let mut ticker = interval_at(first, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.interval.as_secs(),
            run_on_start = self.run_on_start,
            "Schema sync scheduler started"
        );

        tokio::pin!(shutdown);
        let mut ticks = 0u64;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = ticker.tick() => {}
            }

            ticks += 1;
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested during sync cycle, abandoning it");
                    break;
                }
                _ = self.orchestrator.tick() => {}
            }
        }

        let stats = self.orchestrator.stats();
        info!(
            ticks,
            completed = stats.completed,
            failed = stats.failed,
            "Schema sync scheduler stopped"
        );
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use dbmatrix_catalog::{CatalogExecutor, CatalogReader, CatalogRow, StaticExecutor};
    use dbmatrix_graph::{MemoryGraph, SchemaWriter};

    use crate::orchestrator::CycleState;

    /// Tracks how many queries run at once.
    #[derive(Default)]
    struct ConcurrencyProbe {
        delay: Duration,
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogExecutor for ConcurrencyProbe {
        async fn fetch_rows(&self, _sql: &str, _columns: &[&str]) -> Result<Vec<CatalogRow>, sqlx::Error> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn settings(interval_secs: u64, run_on_start: bool) -> SyncSettings {
        SyncSettings {
            interval_secs,
            cycle_timeout_secs: None,
            run_on_start,
        }
    }

    fn scheduler(reader: CatalogReader, graph: &MemoryGraph, settings: &SyncSettings) -> Scheduler<MemoryGraph> {
        let orchestrator = SyncOrchestrator::new(reader, SchemaWriter::new(graph.clone()), settings);
        Scheduler::new(Arc::new(orchestrator), settings)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_rate_from_start() {
        let graph = MemoryGraph::new();
        let reader = CatalogReader::new().with_executor(
            "orders_db",
            Arc::new(StaticExecutor::new().with_table("public", "orders")),
        );
        let settings = settings(300, true);

        // ticks at 0s, 300s and 600s
        let ticks = scheduler(reader, &graph, &settings)
            .run_until(tokio::time::sleep(Duration::from_secs(650)))
            .await;

        assert_eq!(ticks, 3);
        assert_eq!(graph.sessions_opened(), 3);
        assert_eq!(graph.tables().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_interval_does_not_panic() {
        let graph = MemoryGraph::new();
        let reader = CatalogReader::new().with_executor("orders_db", Arc::new(StaticExecutor::new()));
        let settings = settings(u64::MAX, false);

        let ticks = scheduler(reader, &graph, &settings)
            .run_until(tokio::time::sleep(Duration::from_secs(3600)))
            .await;

        assert_eq!(ticks, 0);
        assert_eq!(graph.sessions_opened(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_first_tick() {
        let graph = MemoryGraph::new();
        let reader = CatalogReader::new().with_executor("orders_db", Arc::new(StaticExecutor::new()));
        let settings = settings(300, false);

        let ticks = scheduler(reader, &graph, &settings)
            .run_until(tokio::time::sleep(Duration::from_secs(299)))
            .await;

        assert_eq!(ticks, 0);
        assert_eq!(graph.sessions_opened(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_cycles_do_not_stop_schedule() {
        let graph = MemoryGraph::new();
        let executor = Arc::new(StaticExecutor::new().with_table("public", "orders"));
        executor.fail_with("permission denied for schema public");
        let reader = CatalogReader::new().with_executor("orders_db", executor.clone());
        let settings = settings(60, true);

        let scheduler = scheduler(reader, &graph, &settings);
        let orchestrator = Arc::clone(scheduler.orchestrator());
        let ticks = scheduler
            .run_until(tokio::time::sleep(Duration::from_secs(150)))
            .await;

        assert_eq!(ticks, 3);
        let stats = orchestrator.stats();
        assert_eq!(stats.failed, 3);
        assert_eq!(stats.completed, 0);
        assert_eq!(graph.sessions_opened(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cycles_never_overlap() {
        let graph = MemoryGraph::new();
        let probe = Arc::new(ConcurrencyProbe {
            delay: Duration::from_secs(200),
            ..ConcurrencyProbe::default()
        });
        let reader = CatalogReader::new().with_executor("orders_db", probe.clone());
        let settings = settings(300, true);

        // each cycle takes 400s against a 300s period
        scheduler(reader, &graph, &settings)
            .run_until(tokio::time::sleep(Duration::from_secs(1500)))
            .await;

        assert_eq!(probe.peak.load(Ordering::SeqCst), 1);
        assert!(graph.sessions_opened() >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_in_flight_cycle() {
        let graph = MemoryGraph::new();
        let probe = Arc::new(ConcurrencyProbe {
            delay: Duration::from_secs(100),
            ..ConcurrencyProbe::default()
        });
        let reader = CatalogReader::new().with_executor("orders_db", probe.clone());
        let settings = settings(300, true);

        let scheduler = scheduler(reader, &graph, &settings);
        let orchestrator = Arc::clone(scheduler.orchestrator());
        let ticks = scheduler
            .run_until(tokio::time::sleep(Duration::from_secs(50)))
            .await;

        assert_eq!(ticks, 1);
        assert_eq!(graph.sessions_opened(), 0);
        assert_eq!(orchestrator.state(), CycleState::Idle);
        assert_eq!(orchestrator.stats().completed, 0);
    }
}
