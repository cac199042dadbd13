//! Bulletin feed client.
//!
//! One `GET` per call against the feed's fixed path under the configured base
//! URL. The feed document is a JSON array of bulletins, newest first; only the
//! newest one is returned. There is no retry here: a failed fetch is reported
//! and the next scheduled pass tries again.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use bosai_types::{Event, FeedType};
use serde::de::{Deserialize, Deserializer, IgnoredAny, SeqAccess, Visitor};
use serde_json::Value;

use crate::error::FetchError;

/// Public host of the bulletin feeds.
pub const DEFAULT_FEED_BASE_URL: &str = "https://www.jma.go.jp";

/// Default request timeout in seconds.
pub const DEFAULT_FEED_TIMEOUT_SECS: u64 = 10;

/// Source of the current bulletin for a feed type.
pub trait FeedSource: Send + Sync {
    /// Return the newest bulletin, or `None` when the feed is empty.
    fn fetch(
        &self,
        feed_type: FeedType,
    ) -> impl Future<Output = Result<Option<Event>, FetchError>> + Send;
}

/// Settings for [`FeedClient`].
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// Scheme and host the feed paths are appended to.
    pub base_url: String,
    /// Whole-request timeout (connect, headers and body).
    pub timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FEED_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_FEED_TIMEOUT_SECS),
            user_agent: concat!("bosai-ingest/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// HTTP client for the bulletin feeds.
pub struct FeedClient {
    client: reqwest::Client,
    base_url: String,
}

impl FeedClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns the [`reqwest::Error`] if the TLS backend cannot be initialised.
    pub fn new(config: &FeedClientConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Full URL fetched for `feed_type`.
    pub fn url(&self, feed_type: FeedType) -> String {
        feed_type.url(&self.base_url)
    }
}

impl FeedSource for FeedClient {
    async fn fetch(&self, feed_type: FeedType) -> Result<Option<Event>, FetchError> {
        let url = self.url(feed_type);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(classify_transport_error)?;

        tracing::debug!(
            feed = feed_type.as_str(),
            url = url.as_str(),
            bytes = body.len(),
            "Fetched feed document"
        );

        decode_latest(feed_type, &body)
    }
}

/// Map a transport-level [`reqwest::Error`] to a [`FetchError`].
fn classify_transport_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::NetworkFailure(error.to_string())
    }
}

/// Decode a feed document and return its newest bulletin.
///
/// # Errors
///
/// Returns [`FetchError::MalformedPayload`] if the body is not a JSON array,
/// or if the first element is not an object carrying the feed's id field.
pub fn decode_latest(feed_type: FeedType, body: &[u8]) -> Result<Option<Event>, FetchError> {
    let NewestRecord(newest) = serde_json::from_slice(body).map_err(|e| {
        FetchError::MalformedPayload(format!("body is not a JSON array of bulletins: {e}"))
    })?;

    let Some(latest) = newest else {
        return Ok(None);
    };

    Event::from_record(feed_type, latest)
        .map(Some)
        .map_err(|e| FetchError::MalformedPayload(e.to_string()))
}

/// First element of a JSON array. The remaining elements are checked for
/// syntax only and never materialised.
struct NewestRecord(Option<Value>);

impl<'de> Deserialize<'de> for NewestRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(NewestRecordVisitor)
    }
}

struct NewestRecordVisitor;

impl<'de> Visitor<'de> for NewestRecordVisitor {
    type Value = NewestRecord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON array of bulletin records")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let newest = seq.next_element::<Value>()?;
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(NewestRecord(newest))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn newest_bulletin_is_first() {
        let body = r#"[
            {"eid": "20240101161018", "ttl": "震源・震度情報"},
            {"eid": "20240101160000", "ttl": "震度速報"}
        ]"#;
        let event = decode_latest(FeedType::Earthquake, body.as_bytes())
            .unwrap()
            .unwrap();
        assert_eq!(event.id, "20240101161018");
        assert_eq!(event.feed_type, FeedType::Earthquake);
        assert_eq!(event.payload["ttl"], "震源・震度情報");
    }

    #[test]
    fn empty_array_is_none() {
        assert_eq!(decode_latest(FeedType::Tsunami, b"[]"), Ok(None));
    }

    #[test]
    fn non_array_body_is_malformed() {
        let bodies: [&[u8]; 3] = [br#"{"eid": "E1"}"#, b"<html>", b""];
        for body in bodies {
            assert!(matches!(
                decode_latest(FeedType::Earthquake, body),
                Err(FetchError::MalformedPayload(_))
            ));
        }
    }

    #[test]
    fn missing_id_field_is_malformed() {
        // Volcano bulletins are keyed by `vid`, not `eid`.
        let body = br#"[{"eid": "E1"}]"#;
        assert!(matches!(
            decode_latest(FeedType::Volcano, body),
            Err(FetchError::MalformedPayload(_))
        ));
    }

    #[test]
    fn only_the_newest_record_is_inspected() {
        let body = br#"[{"vid": "V2"}, "not an object"]"#;
        let event = decode_latest(FeedType::Volcano, body).unwrap().unwrap();
        assert_eq!(event.id, "V2");
    }

    #[test]
    fn long_feed_yields_its_first_record() {
        let records: Vec<Value> = (0..500)
            .map(|n| serde_json::json!({ "eid": format!("E{n:03}"), "ttl": "震度速報" }))
            .collect();
        let body = serde_json::to_vec(&records).unwrap();

        let event = decode_latest(FeedType::Earthquake, &body).unwrap().unwrap();
        assert_eq!(event.id, "E000");
    }

    #[test]
    fn broken_tail_is_still_malformed() {
        // Only the first record is kept, but the whole document must parse.
        let body = br#"[{"eid": "E1"}, {"eid": ]"#;
        assert!(matches!(
            decode_latest(FeedType::Earthquake, body),
            Err(FetchError::MalformedPayload(_))
        ));
        let trailing = br#"[{"eid": "E1"}] extra"#;
        assert!(matches!(
            decode_latest(FeedType::Earthquake, trailing),
            Err(FetchError::MalformedPayload(_))
        ));
    }

    #[test]
    fn default_config_points_at_the_public_feeds() {
        let config = FeedClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        let client = FeedClient::new(&config).unwrap();
        assert_eq!(
            client.url(FeedType::Tsunami),
            "https://www.jma.go.jp/bosai/tsunami/data/list.json"
        );
    }
}
