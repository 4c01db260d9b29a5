//! DBMatrix CLI
//!
//! Mirrors the tables and foreign keys of the configured PostgreSQL databases
//! into a Neo4j property graph on a fixed schedule.

use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::Cli;

const DEFAULT_FILTER: &str =
    "dbmatrix=info,dbmatrix_sync=info,dbmatrix_graph=info,dbmatrix_catalog=info,dbmatrix_core=info";

const VERBOSE_FILTER: &str =
    "dbmatrix=debug,dbmatrix_sync=debug,dbmatrix_graph=debug,dbmatrix_catalog=debug,dbmatrix_core=debug";

/// Initialize tracing with optional daily-rolling file logging.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing(log_dir: Option<&std::path::Path>, verbose: bool) -> Option<WorkerGuard> {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| fallback.into());

    if let Some(dir) = log_dir {
        let appender = tracing_appender::rolling::daily(dir, "dbmatrix.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);

        // Log to both stdout and file when --log-dir is used
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
        None
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_tracing(cli.log_dir.as_deref(), cli.verbose);

    cli.execute().await
}
