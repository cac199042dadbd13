//! Cursor persistence: the last event id observed per feed type.
//!
//! The cursor lives apart from the history store so that losing one never
//! loses the other. The default backend is a local `SQLite` file holding a
//! single row per feed type; a `Dragonfly` key per feed is the alternative
//! (see [`crate::dragonfly`]).
//!
//! # Layout
//!
//! | Table | Columns |
//! |-------|---------|
//! | `last_event` | `type TEXT PRIMARY KEY`, `event_id TEXT` |

use std::str::FromStr;

use bosai_types::FeedType;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::dragonfly::DragonflyCursorStore;
use crate::error::StoreError;
use crate::store::CursorStore;

// =========================================================================
// SQLite
// =========================================================================

/// Cursor store backed by a `SQLite` database.
#[derive(Clone)]
pub struct SqliteCursorStore {
    pool: SqlitePool,
}

impl SqliteCursorStore {
    /// Open (creating if missing) the `SQLite` database at `url` and ensure
    /// the `last_event` table exists.
    ///
    /// The pool holds a single connection: cursor traffic is a handful of
    /// statements per pass, and `sqlite::memory:` databases are private to
    /// the connection that created them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL cannot be parsed.
    /// Returns [`StoreError::Sql`] if the database cannot be opened.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Config(format!("Invalid cursor URL: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self::from_pool(pool).await?;
        tracing::info!("Opened SQLite cursor store");
        Ok(store)
    }

    /// Wrap an existing pool, creating the `last_event` table if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sql`] if the table cannot be created.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            r"CREATE TABLE IF NOT EXISTS last_event (
                  type     TEXT PRIMARY KEY,
                  event_id TEXT
              )",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl CursorStore for SqliteCursorStore {
    async fn get(&self, feed_type: FeedType) -> Result<Option<String>, StoreError> {
        let row: Option<Option<String>> =
            sqlx::query_scalar("SELECT event_id FROM last_event WHERE type = ?1")
                .bind(feed_type.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.flatten())
    }

    async fn set(&self, feed_type: FeedType, event_id: &str) -> Result<(), StoreError> {
        // The WHERE clause turns a repeat of the current value into a no-op.
        sqlx::query(
            r"INSERT INTO last_event (type, event_id) VALUES (?1, ?2)
              ON CONFLICT(type) DO UPDATE SET event_id = excluded.event_id
              WHERE last_event.event_id IS NOT excluded.event_id",
        )
        .bind(feed_type.as_str())
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        tracing::debug!(feed = feed_type.as_str(), event_id, "Cursor set");
        Ok(())
    }
}

// =========================================================================
// Runtime-selected backend
// =========================================================================

/// A durable cursor backend chosen at startup from the cursor URL.
///
/// Uses enum dispatch so the orchestrator stays generic over a single
/// concrete [`CursorStore`] type.
#[derive(Clone)]
pub enum CursorBackend {
    /// Local `SQLite` file (`sqlite:` URLs).
    Sqlite(SqliteCursorStore),
    /// `Dragonfly`/Redis keys (`redis:` and `rediss:` URLs).
    Dragonfly(DragonflyCursorStore),
}

impl CursorBackend {
    /// Connect to the backend named by the URL scheme.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] for an unsupported scheme, or the
    /// backend's connection error.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        match url.split_once(':').map(|(scheme, _)| scheme) {
            Some("sqlite") => Ok(Self::Sqlite(SqliteCursorStore::connect(url).await?)),
            Some("redis" | "rediss") => {
                Ok(Self::Dragonfly(DragonflyCursorStore::connect(url).await?))
            }
            _ => Err(StoreError::Config(format!(
                "unsupported cursor URL scheme: {url}"
            ))),
        }
    }

    /// Human-readable backend name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Dragonfly(_) => "dragonfly",
        }
    }

    /// Release the backend's connections.
    pub async fn close(&self) {
        match self {
            Self::Sqlite(store) => store.close().await,
            Self::Dragonfly(store) => store.close().await,
        }
    }
}

impl CursorStore for CursorBackend {
    async fn get(&self, feed_type: FeedType) -> Result<Option<String>, StoreError> {
        match self {
            Self::Sqlite(store) => store.get(feed_type).await,
            Self::Dragonfly(store) => store.get(feed_type).await,
        }
    }

    async fn set(&self, feed_type: FeedType, event_id: &str) -> Result<(), StoreError> {
        match self {
            Self::Sqlite(store) => store.set(feed_type, event_id).await,
            Self::Dragonfly(store) => store.set(feed_type, event_id).await,
        }
    }
}
