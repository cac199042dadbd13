//! `Dragonfly` (Redis-compatible) cursor backend.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `cursor:{feed}` | String | Last event id recorded for the feed |

use bosai_types::FeedType;
use fred::prelude::*;

use crate::error::StoreError;
use crate::store::CursorStore;

/// Cursor store holding one `Dragonfly` key per feed type.
#[derive(Clone)]
pub struct DragonflyCursorStore {
    client: Client,
}

impl DragonflyCursorStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL cannot be parsed.
    /// Returns [`StoreError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let config = Config::from_url(url)
            .map_err(|e| StoreError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly cursor store");
        Ok(Self { client })
    }

    /// Remove the cursor for `feed_type`, so the next pass treats the feed
    /// as never ingested.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Dragonfly`] if the delete fails.
    pub async fn clear(&self, feed_type: FeedType) -> Result<(), StoreError> {
        let _: u32 = self.client.del(cursor_key(feed_type)).await?;
        Ok(())
    }

    /// Disconnect from `Dragonfly`.
    pub async fn close(&self) {
        if let Err(e) = self.client.quit().await {
            tracing::warn!(error = %e, "Dragonfly quit failed");
        }
    }
}

impl CursorStore for DragonflyCursorStore {
    async fn get(&self, feed_type: FeedType) -> Result<Option<String>, StoreError> {
        let value: Option<String> = self.client.get(cursor_key(feed_type)).await?;
        Ok(value)
    }

    async fn set(&self, feed_type: FeedType, event_id: &str) -> Result<(), StoreError> {
        let _: () = self
            .client
            .set(cursor_key(feed_type), event_id, None, None, false)
            .await?;
        tracing::debug!(feed = feed_type.as_str(), event_id, "Cursor set");
        Ok(())
    }
}

fn cursor_key(feed_type: FeedType) -> String {
    format!("cursor:{}", feed_type.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_per_feed() {
        assert_eq!(cursor_key(FeedType::Earthquake), "cursor:earthquake");
        assert_eq!(cursor_key(FeedType::Volcano), "cursor:volcano");
    }
}
