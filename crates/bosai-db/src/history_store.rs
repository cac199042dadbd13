//! `PostgreSQL` history store.
//!
//! Each feed type has its own append-only table (see [`FeedType::history_table`]).
//! Rows are keyed by event id; writes use `ON CONFLICT (eid) DO NOTHING` so
//! a duplicate append is absorbed by the database rather than surfacing as a
//! uniqueness violation. Payloads are stored as serialized JSON text, which is
//! also what the dashboard decodes.

use bosai_types::{AppendOutcome, Event, FeedType, HistoryRecord};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::store::HistoryStore;

/// History store over the per-feed `PostgreSQL` tables.
#[derive(Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
}

impl PgHistoryStore {
    /// Create a history store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl HistoryStore for PgHistoryStore {
    async fn append(&self, event: &Event) -> Result<AppendOutcome, StoreError> {
        let raw_json = serde_json::to_string(&event.payload)?;

        // Table names come from the static feed table, never from input.
        let sql = format!(
            "INSERT INTO {} (eid, raw_json, created_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (eid) DO NOTHING
             RETURNING eid",
            event.feed_type.history_table()
        );

        let inserted: Option<String> = sqlx::query_scalar(&sql)
            .bind(&event.id)
            .bind(&raw_json)
            .fetch_optional(&self.pool)
            .await?;

        let outcome = if inserted.is_some() {
            AppendOutcome::Inserted
        } else {
            AppendOutcome::AlreadyPresent
        };

        tracing::debug!(
            feed = event.feed_type.as_str(),
            event_id = event.id.as_str(),
            ?outcome,
            "History append"
        );

        Ok(outcome)
    }

    async fn query(
        &self,
        feed_type: FeedType,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let sql = format!(
            "SELECT eid, raw_json, created_at
             FROM {}
             ORDER BY created_at DESC, eid DESC
             LIMIT $1",
            feed_type.history_table()
        );

        let rows = sqlx::query_as::<_, HistoryRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| row.into_record(feed_type))
            .collect()
    }
}

/// A row from one of the `dis_*_history` tables.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryRow {
    /// Event id.
    pub eid: String,
    /// Bulletin serialized as JSON text.
    pub raw_json: String,
    /// Server-assigned insertion time.
    pub created_at: DateTime<Utc>,
}

impl HistoryRow {
    /// Decode the stored payload into a [`HistoryRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if `raw_json` is not valid JSON.
    pub fn into_record(self, feed_type: FeedType) -> Result<HistoryRecord, StoreError> {
        Ok(HistoryRecord {
            feed_type,
            event_id: self.eid,
            payload: serde_json::from_str(&self.raw_json)?,
            ingested_at: self.created_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn row_decodes_stored_payload() {
        let row = HistoryRow {
            eid: "E100".to_owned(),
            raw_json: r#"{"eid":"E100","anm":"石川県能登地方"}"#.to_owned(),
            created_at: Utc::now(),
        };
        let record = row.into_record(FeedType::Earthquake).unwrap();
        assert_eq!(record.event_id, "E100");
        assert_eq!(record.payload["anm"], "石川県能登地方");
    }

    #[test]
    fn corrupt_payload_is_a_serialization_error() {
        let row = HistoryRow {
            eid: "E1".to_owned(),
            raw_json: "{not json".to_owned(),
            created_at: Utc::now(),
        };
        assert!(matches!(
            row.into_record(FeedType::Tsunami),
            Err(StoreError::Serialization(_))
        ));
    }
}
