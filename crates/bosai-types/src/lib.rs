//! Shared type definitions for the bosai bulletin ingestion core.
//!
//! Types defined here are used by the stores and the ingestion orchestrator,
//! and the read-model types flow downstream to `TypeScript` via `ts-rs` for
//! the dashboard that displays ingested history.
//!
//! # Modules
//!
//! - [`enums`] -- Feed types, the static per-feed table, append outcomes
//! - [`structs`] -- Bulletin events and history records

pub mod enums;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AppendOutcome, FeedSpec, FeedType, UnknownFeedType};
pub use structs::{Event, EventIdError, HistoryRecord};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the dashboard read model.

    #[test]
    fn export_bindings() {
        // The files are written to the `bindings/` directory relative to
        // the crate root.
        use ts_rs::TS;

        let _ = crate::enums::FeedType::export_all();
        let _ = crate::enums::AppendOutcome::export_all();
        let _ = crate::structs::Event::export_all();
        let _ = crate::structs::HistoryRecord::export_all();
    }
}
