//! Bulletin ingestion for the bosai disaster feeds.
//!
//! Polls the earthquake, tsunami and volcano feeds, detects when a feed has
//! moved to a new bulletin, and records each new bulletin exactly once in the
//! history store.
//!
//! # Architecture
//!
//! ```text
//! FeedClient --> IngestionOrchestrator --+--> HistoryStore (append, idempotent)
//!                      ^                 |
//!                      +-- CursorStore <-+    (advanced only after append)
//! ```
//!
//! One call to [`IngestionOrchestrator::run_pass`] is one pass. The cadence
//! of passes belongs to whoever runs the `bosai-ingest` binary (cron, a
//! scheduled job, or a person).
//!
//! # Modules
//!
//! - [`feed`] -- HTTP feed client and the `FeedSource` seam
//! - [`orchestrator`] -- Per-feed change detection and write ordering
//! - [`config`] -- Environment-driven configuration
//! - [`error`] -- Fetch, ingest, config and startup errors

pub mod config;
pub mod error;
pub mod feed;
pub mod orchestrator;

pub use config::{IngestConfig, LogFormat};
pub use error::{AppError, ConfigError, FetchError, IngestError, StoreStage};
pub use feed::{FeedClient, FeedClientConfig, FeedSource};
pub use orchestrator::{FeedOutcome, IngestionOrchestrator, OrchestratorConfig, PassSummary};
