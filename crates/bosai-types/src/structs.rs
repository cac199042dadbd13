//! Core record types: bulletin events and their persisted history rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::enums::FeedType;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A single bulletin as delivered by a feed.
///
/// The payload is kept opaque; only the id is derived from it, using the
/// feed's configured id field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Feed the bulletin came from.
    pub feed_type: FeedType,
    /// Event identifier extracted from the payload.
    pub id: String,
    /// The bulletin record exactly as received.
    pub payload: Value,
}

/// Why an event id could not be derived from a bulletin record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventIdError {
    /// The record is not a JSON object.
    #[error("bulletin record is not a JSON object")]
    NotAnObject,

    /// The id field is absent.
    #[error("bulletin record has no `{0}` field")]
    Missing(&'static str),

    /// The id field is present but is not a non-empty string or a number.
    #[error("bulletin field `{0}` is not a usable id")]
    Invalid(&'static str),
}

impl Event {
    /// Build an event from a raw bulletin record.
    ///
    /// String ids are taken verbatim; numeric ids are rendered in decimal.
    pub fn from_record(feed_type: FeedType, payload: Value) -> Result<Self, EventIdError> {
        let id = extract_id(feed_type, &payload)?;
        Ok(Self {
            feed_type,
            id,
            payload,
        })
    }
}

fn extract_id(feed_type: FeedType, record: &Value) -> Result<String, EventIdError> {
    let field = feed_type.id_field();
    let object = record.as_object().ok_or(EventIdError::NotAnObject)?;
    match object.get(field) {
        None => Err(EventIdError::Missing(field)),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(EventIdError::Invalid(field)),
    }
}

// ---------------------------------------------------------------------------
// HistoryRecord
// ---------------------------------------------------------------------------

/// One ingested event in a feed's append-only history.
///
/// This is the read model handed to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HistoryRecord {
    /// Feed the event belongs to.
    pub feed_type: FeedType,
    /// Event id, unique within the feed's history.
    pub event_id: String,
    /// Decoded bulletin payload.
    pub payload: Value,
    /// Server-assigned insertion time.
    pub ingested_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn earthquake_id_comes_from_eid() {
        let event = Event::from_record(
            FeedType::Earthquake,
            json!({"eid": "20240101161018", "anm": "能登半島沖", "mag": "7.6"}),
        );
        assert_eq!(
            event.map(|e| e.id),
            Ok("20240101161018".to_owned())
        );
    }

    #[test]
    fn volcano_id_comes_from_vid() {
        let record = json!({"eid": "ignored", "vid": "V42"});
        let event = Event::from_record(FeedType::Volcano, record.clone());
        assert_eq!(
            event,
            Ok(Event {
                feed_type: FeedType::Volcano,
                id: "V42".to_owned(),
                payload: record,
            })
        );
    }

    #[test]
    fn numeric_id_is_rendered_as_decimal() {
        let event = Event::from_record(FeedType::Tsunami, json!({"eid": 20_240_101}));
        assert_eq!(event.map(|e| e.id), Ok("20240101".to_owned()));
    }

    #[test]
    fn unusable_records_are_rejected() {
        assert_eq!(
            Event::from_record(FeedType::Earthquake, json!(["eid"])),
            Err(EventIdError::NotAnObject)
        );
        assert_eq!(
            Event::from_record(FeedType::Volcano, json!({"eid": "E1"})),
            Err(EventIdError::Missing("vid"))
        );
        assert_eq!(
            Event::from_record(FeedType::Earthquake, json!({"eid": ""})),
            Err(EventIdError::Invalid("eid"))
        );
        assert_eq!(
            Event::from_record(FeedType::Earthquake, json!({"eid": null})),
            Err(EventIdError::Invalid("eid"))
        );
    }
}
