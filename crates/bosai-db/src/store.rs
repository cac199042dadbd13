//! Store contracts consumed by the ingestion orchestrator.
//!
//! The cursor and the history live in separate failure domains and share no
//! transaction. The orchestrator keeps them consistent by ordering its writes
//! (history first, cursor second), so each store only has to be safe under
//! its own concurrent callers.
//!
//! Methods return `impl Future + Send` so orchestrator passes can be driven
//! from a multi-threaded runtime. Implementations are free to write them as
//! plain `async fn`.

use std::future::Future;

use bosai_types::{AppendOutcome, Event, FeedType, HistoryRecord};

use crate::error::StoreError;

/// Number of records the dashboard asks for when it does not say otherwise.
pub const DEFAULT_QUERY_LIMIT: usize = 10;

/// Durable record of the last event id observed per feed type.
pub trait CursorStore: Send + Sync {
    /// Return the last recorded event id, or `None` if the feed was never
    /// ingested.
    fn get(
        &self,
        feed_type: FeedType,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Record `event_id` as the feed's cursor.
    ///
    /// Idempotent upsert: setting the current value again changes nothing,
    /// setting a different value overwrites. Concurrent calls are
    /// last-write-wins.
    fn set(
        &self,
        feed_type: FeedType,
        event_id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Append-only, per-feed history of ingested events.
pub trait HistoryStore: Send + Sync {
    /// Insert `event` into its feed's history unless a record with the same id
    /// already exists.
    ///
    /// Insert-if-absent is atomic: when callers race on the same id, exactly
    /// one row survives and every caller gets `Ok`.
    fn append(
        &self,
        event: &Event,
    ) -> impl Future<Output = Result<AppendOutcome, StoreError>> + Send;

    /// Return at most `limit` records for `feed_type`, most recent first.
    fn query(
        &self,
        feed_type: FeedType,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<HistoryRecord>, StoreError>> + Send;

    /// The dashboard's view: the [`DEFAULT_QUERY_LIMIT`] most recent records.
    fn latest(
        &self,
        feed_type: FeedType,
    ) -> impl Future<Output = Result<Vec<HistoryRecord>, StoreError>> + Send {
        self.query(feed_type, DEFAULT_QUERY_LIMIT)
    }
}
