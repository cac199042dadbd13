//! Ingestion pass entry point.
//!
//! Runs exactly one pass over the configured feeds and exits. Scheduling is
//! external: the binary is meant to be triggered by cron or a scheduled job.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize structured logging (tracing)
//! 3. Connect to `PostgreSQL` and run history migrations
//! 4. Open the cursor store
//! 5. Build the feed client and orchestrator
//! 6. Run one pass and log the summary
//!
//! The process exits with status 1 when any feed failed, so the scheduler can
//! alert on repeated failures.

use std::process::ExitCode;

use bosai_db::{CursorBackend, PostgresConfig, PostgresPool};
use bosai_ingest::{AppError, FeedClient, IngestConfig, IngestionOrchestrator, LogFormat};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or a store cannot be opened.
/// Per-feed failures during the pass are reported through the exit code.
#[tokio::main]
async fn main() -> Result<ExitCode, AppError> {
    // 1. Load configuration.
    let config = IngestConfig::from_env()?;

    // 2. Initialize structured logging.
    init_tracing(config.log_format);
    info!("bosai-ingest starting");
    info!(
        cursor_url = config.cursor_url.as_str(),
        feed_base_url = config.feed.base_url.as_str(),
        feed_types = ?config.feed_types,
        feed_timeout_ms = config.feed.timeout.as_millis(),
        store_timeout_ms = config.store_timeout.as_millis(),
        "Configuration loaded"
    );

    // 3. History store.
    let postgres = PostgresPool::connect(
        &PostgresConfig::new(&config.database_url)
            .with_max_connections(config.db_max_connections),
    )
    .await?;
    postgres.run_migrations().await?;

    // 4. Cursor store.
    let cursors = CursorBackend::connect(&config.cursor_url).await?;
    info!(backend = cursors.name(), "Cursor store ready");

    // 5. Feed client and orchestrator.
    let feeds = FeedClient::new(&config.feed)?;
    let orchestrator = IngestionOrchestrator::new(
        feeds,
        cursors,
        postgres.history_store(),
        &config.orchestrator(),
    );

    // 6. One pass.
    let summary = orchestrator.run_pass().await;

    orchestrator.cursors().close().await;
    postgres.close().await;

    Ok(if summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Install the global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}
