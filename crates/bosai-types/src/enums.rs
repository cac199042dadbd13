//! Enumeration types for the bulletin ingestion core.
//!
//! [`FeedType`] is a closed set. Everything that differs between feeds (the
//! source path, the payload field carrying the event id, the history table)
//! lives in the static [`FeedSpec`] table rather than in branching code, so
//! adding a feed is a data change.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Feed types
// ---------------------------------------------------------------------------

/// A disaster-bulletin category published by the upstream authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum FeedType {
    /// Earthquake information (hypocenter and intensity reports).
    Earthquake,
    /// Tsunami warnings and advisories.
    Tsunami,
    /// Volcanic warnings and eruption reports.
    Volcano,
}

/// Static per-feed metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSpec {
    /// Stable lowercase name, used as the cursor key and in logs.
    pub name: &'static str,
    /// Path of the feed document, relative to the authority's base URL.
    pub path: &'static str,
    /// Payload field that carries the event identifier.
    pub id_field: &'static str,
    /// History table holding this feed's ingested events.
    pub history_table: &'static str,
}

const EARTHQUAKE: FeedSpec = FeedSpec {
    name: "earthquake",
    path: "/bosai/quake/data/list.json",
    id_field: "eid",
    history_table: "dis_quake_history",
};

const TSUNAMI: FeedSpec = FeedSpec {
    name: "tsunami",
    path: "/bosai/tsunami/data/list.json",
    id_field: "eid",
    history_table: "dis_tsunami_history",
};

const VOLCANO: FeedSpec = FeedSpec {
    name: "volcano",
    path: "/bosai/volcano/data/list.json",
    id_field: "vid",
    history_table: "dis_volcano_history",
};

impl FeedType {
    /// Every feed type, in the order a pass visits them by default.
    pub const ALL: [Self; 3] = [Self::Earthquake, Self::Tsunami, Self::Volcano];

    /// Return the static metadata for this feed.
    pub const fn spec(self) -> &'static FeedSpec {
        match self {
            Self::Earthquake => &EARTHQUAKE,
            Self::Tsunami => &TSUNAMI,
            Self::Volcano => &VOLCANO,
        }
    }

    /// Stable lowercase name (`earthquake`, `tsunami`, `volcano`).
    pub const fn as_str(self) -> &'static str {
        self.spec().name
    }

    /// Name of the payload field carrying the event id.
    pub const fn id_field(self) -> &'static str {
        self.spec().id_field
    }

    /// Name of the history table for this feed.
    pub const fn history_table(self) -> &'static str {
        self.spec().history_table
    }

    /// Build the full feed URL under the given base (no trailing slash needed).
    pub fn url(self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.spec().path)
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known [`FeedType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feed type: {0}")]
pub struct UnknownFeedType(pub String);

impl FromStr for FeedType {
    type Err = UnknownFeedType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|feed| feed.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownFeedType(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Append outcome
// ---------------------------------------------------------------------------

/// Result of an idempotent history append.
///
/// Both variants are successes. `AlreadyPresent` is what a retried or racing
/// append observes; it is never surfaced as a uniqueness failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AppendOutcome {
    /// A new history record was written.
    Inserted,
    /// A record with the same event id already existed; nothing was written.
    AlreadyPresent,
}
