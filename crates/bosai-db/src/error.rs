//! Error types for the data layer.
//!
//! Every store reports failures through [`StoreError`], which wraps the
//! underlying [`sqlx`] and [`fred`] errors. A `StoreError` always means the
//! durable backend could not complete the call. A duplicate history append is
//! not an error; it is reported as
//! [`AppendOutcome::AlreadyPresent`](bosai_types::AppendOutcome).

use std::time::Duration;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A SQL (`PostgreSQL` or `SQLite`) operation failed.
    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A payload could not be serialized or a stored payload could not be
    /// decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store did not answer within the allotted time.
    #[error("{operation} timed out after {}ms", after.as_millis())]
    Timeout {
        /// The store operation that was abandoned.
        operation: &'static str,
        /// How long the caller waited.
        after: Duration,
    },

    /// A configuration error (bad URL, unsupported scheme).
    #[error("configuration error: {0}")]
    Config(String),
}
