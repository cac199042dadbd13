//! Data layer for the bosai ingestion core.
//!
//! Two durable stores with no shared transaction:
//!
//! ```text
//! Ingestion pass (per feed type)
//!     |
//!     +-- 1. append event ------> PostgreSQL (PgHistoryStore)
//!     |                            dis_{quake,tsunami,volcano}_history
//!     |
//!     +-- 2. advance cursor ----> SQLite last_event  (SqliteCursorStore)
//!                                 or Dragonfly cursor:{feed} (DragonflyCursorStore)
//! ```
//!
//! The history append is idempotent, so a cursor that lags behind the
//! history (crash between steps 1 and 2) is repaired by the next pass.
//!
//! # Modules
//!
//! - [`store`] -- `CursorStore` and `HistoryStore` contracts
//! - [`postgres`] -- `PostgreSQL` connection pool, configuration, migrations
//! - [`history_store`] -- Insert-if-absent history appends and dashboard queries
//! - [`cursor_store`] -- `SQLite` cursor store and runtime backend selection
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) cursor store
//! - [`memory`] -- In-process stores for tests and dry runs
//! - [`error`] -- Shared error types

pub mod cursor_store;
pub mod dragonfly;
pub mod error;
pub mod history_store;
pub mod memory;
pub mod postgres;
pub mod store;

// Re-export primary types for convenience.
pub use cursor_store::{CursorBackend, SqliteCursorStore};
pub use dragonfly::DragonflyCursorStore;
pub use error::StoreError;
pub use history_store::{HistoryRow, PgHistoryStore};
pub use memory::{MemoryCursorStore, MemoryHistoryStore};
pub use postgres::{PostgresConfig, PostgresPool};
pub use store::{CursorStore, DEFAULT_QUERY_LIMIT, HistoryStore};
