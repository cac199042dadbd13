//! Error types for the ingestion pipeline.
//!
//! Uses `thiserror` for typed errors that surface through the pipeline:
//! feed fetches, store calls, configuration, and binary startup.

use core::fmt;

use bosai_db::StoreError;

/// Why a feed fetch produced no usable answer.
///
/// All kinds are treated as transient: the feed is skipped for this pass and
/// retried on the next one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("feed request timed out")]
    Timeout,

    /// The feed host could not be reached or the connection broke.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The feed answered with a non-2xx status.
    #[error("feed returned HTTP {0}")]
    HttpStatus(u16),

    /// The body was not a JSON array of bulletins, or the newest bulletin
    /// carried no usable id.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// The store call a failed feed step was making.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStage {
    /// Reading the feed's cursor.
    ReadCursor,
    /// Appending the new event to history.
    AppendHistory,
    /// Moving the cursor to the new event.
    AdvanceCursor,
}

impl StoreStage {
    /// Stable name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadCursor => "read_cursor",
            Self::AppendHistory => "append_history",
            Self::AdvanceCursor => "advance_cursor",
        }
    }
}

impl fmt::Display for StoreStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure that ended one feed's step of a pass.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The feed could not be fetched or decoded.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A store call failed or timed out.
    #[error("{stage} failed: {source}")]
    Store {
        /// Which store call failed.
        stage: StoreStage,
        /// The underlying store error.
        #[source]
        source: StoreError,
    },
}

/// Configuration is missing or invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required env var {0}")]
    Missing(&'static str),

    /// An environment variable could not be parsed.
    #[error("invalid {name}: {message}")]
    Invalid {
        /// The offending variable.
        name: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

/// Top-level error for the `bosai-ingest` binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A store could not be opened or migrated.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}
