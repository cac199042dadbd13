//! In-process stores for tests and dry runs.
//!
//! Both stores honour the same contracts as their durable counterparts:
//! the history is insert-if-absent per `(feed, id)` and ordered by insertion,
//! and the cursor is a last-write-wins map. Nothing survives the process.

use std::collections::BTreeMap;

use bosai_types::{AppendOutcome, Event, FeedType, HistoryRecord};
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::{CursorStore, HistoryStore};

/// Cursor store backed by an in-memory map.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    cursors: Mutex<BTreeMap<FeedType, String>>,
}

impl MemoryCursorStore {
    /// Create an empty cursor store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose cursor for `feed_type` is already `event_id`.
    pub fn with_cursor(feed_type: FeedType, event_id: &str) -> Self {
        let mut cursors = BTreeMap::new();
        cursors.insert(feed_type, event_id.to_owned());
        Self {
            cursors: Mutex::new(cursors),
        }
    }
}

impl CursorStore for MemoryCursorStore {
    async fn get(&self, feed_type: FeedType) -> Result<Option<String>, StoreError> {
        Ok(self.cursors.lock().await.get(&feed_type).cloned())
    }

    async fn set(&self, feed_type: FeedType, event_id: &str) -> Result<(), StoreError> {
        self.cursors
            .lock()
            .await
            .insert(feed_type, event_id.to_owned());
        Ok(())
    }
}

/// History store backed by in-memory, per-feed vectors.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: Mutex<BTreeMap<FeedType, Vec<HistoryRecord>>>,
}

impl MemoryHistoryStore {
    /// Create an empty history store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held for `feed_type`.
    pub async fn len(&self, feed_type: FeedType) -> usize {
        self.records.lock().await.get(&feed_type).map_or(0, Vec::len)
    }

    /// Total number of records across all feeds.
    pub async fn total(&self) -> usize {
        self.records.lock().await.values().map(Vec::len).sum()
    }
}

impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, event: &Event) -> Result<AppendOutcome, StoreError> {
        let mut records = self.records.lock().await;
        let history = records.entry(event.feed_type).or_default();

        if history.iter().any(|r| r.event_id == event.id) {
            return Ok(AppendOutcome::AlreadyPresent);
        }

        history.push(HistoryRecord {
            feed_type: event.feed_type,
            event_id: event.id.clone(),
            payload: event.payload.clone(),
            ingested_at: Utc::now(),
        });
        Ok(AppendOutcome::Inserted)
    }

    async fn query(
        &self,
        feed_type: FeedType,
        limit: usize,
    ) -> Result<Vec<HistoryRecord>, StoreError> {
        let records = self.records.lock().await;
        Ok(records
            .get(&feed_type)
            .map(|history| history.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn quake(id: &str) -> Event {
        Event::from_record(FeedType::Earthquake, json!({ "eid": id })).unwrap()
    }

    #[tokio::test]
    async fn duplicate_append_is_absorbed() {
        let store = MemoryHistoryStore::new();
        let event = quake("E100");

        assert_eq!(store.append(&event).await.unwrap(), AppendOutcome::Inserted);
        assert_eq!(
            store.append(&event).await.unwrap(),
            AppendOutcome::AlreadyPresent
        );
        assert_eq!(store.len(FeedType::Earthquake).await, 1);
    }

    #[tokio::test]
    async fn same_id_in_different_feeds_is_distinct() {
        let store = MemoryHistoryStore::new();
        let tsunami = Event::from_record(FeedType::Tsunami, json!({ "eid": "E100" })).unwrap();

        store.append(&quake("E100")).await.unwrap();
        assert_eq!(store.append(&tsunami).await.unwrap(), AppendOutcome::Inserted);
        assert_eq!(store.total().await, 2);
    }

    #[tokio::test]
    async fn query_is_newest_first_and_bounded() {
        let store = MemoryHistoryStore::new();
        for id in ["E1", "E2", "E3"] {
            store.append(&quake(id)).await.unwrap();
        }

        let ids: Vec<String> = store
            .query(FeedType::Earthquake, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.event_id)
            .collect();
        assert_eq!(ids, ["E3", "E2"]);
        assert!(store.query(FeedType::Volcano, 10).await.unwrap().is_empty());
        assert!(store.query(FeedType::Earthquake, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn racing_appends_leave_one_record() {
        let store = Arc::new(MemoryHistoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.append(&quake("E9")).await }));
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap().unwrap());
        }
        let inserted = outcomes
            .iter()
            .filter(|o| **o == AppendOutcome::Inserted)
            .count();
        assert_eq!(inserted, 1);
        assert_eq!(store.len(FeedType::Earthquake).await, 1);
    }

    #[tokio::test]
    async fn cursor_seeding_and_overwrite() {
        let store = MemoryCursorStore::with_cursor(FeedType::Volcano, "V1");
        assert_eq!(store.get(FeedType::Volcano).await.unwrap().as_deref(), Some("V1"));
        assert_eq!(store.get(FeedType::Earthquake).await.unwrap(), None);

        store.set(FeedType::Volcano, "V2").await.unwrap();
        assert_eq!(store.get(FeedType::Volcano).await.unwrap().as_deref(), Some("V2"));
    }
}
