//! Ingestion orchestrator: one polling pass over the configured feeds.
//!
//! For each feed type, independently and concurrently:
//! 1. Fetch the newest bulletin (empty feed or fetch error ends the step)
//! 2. Read the feed's cursor
//! 3. Same id as the cursor: nothing to do
//! 4. Otherwise append to history, then advance the cursor
//!
//! The cursor is only advanced after the history append has returned `Ok`
//! (`Inserted` or `AlreadyPresent`). If the process dies, or the cursor write
//! fails, between steps 4a and 4b, the next pass sees a stale cursor, appends
//! again (absorbed as `AlreadyPresent`) and then advances the cursor. No event
//! that reached the orchestrator is lost and none is recorded twice.
//!
//! Only the newest bulletin is compared, so an event that is published and
//! superseded between two passes is never seen.

use std::future::Future;
use std::time::{Duration, Instant};

use bosai_db::{CursorStore, HistoryStore, StoreError};
use bosai_types::{AppendOutcome, FeedType};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::error::{IngestError, StoreStage};
use crate::feed::FeedSource;

/// Default bound on a single store call, in seconds.
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;

/// Settings for [`IngestionOrchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Feeds visited by each pass, in summary order.
    pub feed_types: Vec<FeedType>,
    /// Upper bound on each cursor or history call.
    pub store_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            feed_types: FeedType::ALL.to_vec(),
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
        }
    }
}

/// How one feed's step of a pass ended.
#[derive(Debug)]
pub enum FeedOutcome {
    /// A new event id was seen; history holds it and the cursor points at it.
    Ingested {
        /// Id of the ingested event.
        event_id: String,
        /// Whether this pass wrote the history row or found it already there.
        append: AppendOutcome,
    },
    /// The newest bulletin matches the cursor; nothing was written.
    Unchanged {
        /// Id shared by the bulletin and the cursor.
        event_id: String,
    },
    /// The feed currently publishes no bulletins; nothing was written.
    Empty,
    /// The step stopped early. The cursor was not advanced.
    Failed(IngestError),
}

impl FeedOutcome {
    /// Short label for logs and summaries.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ingested { .. } => "ingested",
            Self::Unchanged { .. } => "unchanged",
            Self::Empty => "empty",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether a new event was recorded.
    pub const fn is_ingested(&self) -> bool {
        matches!(self, Self::Ingested { .. })
    }

    /// Whether the bulletin matched the cursor.
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged { .. })
    }

    /// Whether the feed published nothing.
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Whether the step ended in an error.
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Per-feed results of one pass, in configuration order.
#[derive(Debug, Default)]
pub struct PassSummary {
    /// One entry per configured feed type.
    pub outcomes: Vec<(FeedType, FeedOutcome)>,
}

impl PassSummary {
    /// Outcome recorded for `feed_type`, if it was part of the pass.
    pub fn get(&self, feed_type: FeedType) -> Option<&FeedOutcome> {
        self.outcomes
            .iter()
            .find(|(feed, _)| *feed == feed_type)
            .map(|(_, outcome)| outcome)
    }

    /// Feeds whose step failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (FeedType, &IngestError)> {
        self.outcomes.iter().filter_map(|(feed, outcome)| match outcome {
            FeedOutcome::Failed(e) => Some((*feed, e)),
            _ => None,
        })
    }

    /// Whether any feed failed.
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|(_, outcome)| outcome.is_failure())
    }

    /// Number of feeds whose outcome satisfies `predicate`, e.g.
    /// `summary.count(FeedOutcome::is_failure)`.
    pub fn count(&self, predicate: impl Fn(&FeedOutcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}

/// Drives ingestion passes over a feed source, a cursor store and a history
/// store.
pub struct IngestionOrchestrator<F, C, H> {
    feeds: F,
    cursors: C,
    history: H,
    feed_types: Vec<FeedType>,
    store_timeout: Duration,
}

impl<F, C, H> IngestionOrchestrator<F, C, H>
where
    F: FeedSource,
    C: CursorStore,
    H: HistoryStore,
{
    /// Create an orchestrator from its collaborators.
    pub fn new(feeds: F, cursors: C, history: H, config: &OrchestratorConfig) -> Self {
        Self {
            feeds,
            cursors,
            history,
            feed_types: config.feed_types.clone(),
            store_timeout: config.store_timeout,
        }
    }

    /// Feeds visited by each pass.
    pub fn feed_types(&self) -> &[FeedType] {
        &self.feed_types
    }

    /// The cursor store.
    pub const fn cursors(&self) -> &C {
        &self.cursors
    }

    /// The history store, which also serves dashboard queries.
    pub const fn history(&self) -> &H {
        &self.history
    }

    /// Run one ingestion pass over every configured feed.
    ///
    /// Never fails as a whole: each feed's failure is captured in its
    /// [`FeedOutcome`] and does not affect the others.
    pub async fn run_pass(&self) -> PassSummary {
        let started = Instant::now();

        let steps = self.feed_types.iter().map(|&feed| self.ingest_feed(feed));
        let outcomes = join_all(steps).await;

        let summary = PassSummary {
            outcomes: self.feed_types.iter().copied().zip(outcomes).collect(),
        };

        info!(
            feeds = summary.outcomes.len(),
            ingested = summary.count(FeedOutcome::is_ingested),
            unchanged = summary.count(FeedOutcome::is_unchanged),
            empty = summary.count(FeedOutcome::is_empty),
            failed = summary.count(FeedOutcome::is_failure),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Ingestion pass complete"
        );

        summary
    }

    /// Run one feed's step inside its own span and log how it ended.
    #[tracing::instrument(name = "feed", skip_all, fields(feed = feed_type.as_str()))]
    async fn ingest_feed(&self, feed_type: FeedType) -> FeedOutcome {
        let outcome = self
            .step(feed_type)
            .await
            .unwrap_or_else(FeedOutcome::Failed);

        match &outcome {
            FeedOutcome::Ingested { event_id, append } => {
                info!(event_id = event_id.as_str(), ?append, "New bulletin recorded");
            }
            FeedOutcome::Unchanged { event_id } => {
                debug!(event_id = event_id.as_str(), "No new bulletin");
            }
            FeedOutcome::Empty => info!("Feed has no bulletins"),
            FeedOutcome::Failed(e @ IngestError::Fetch(_)) => {
                warn!(error = %e, "Feed skipped this pass");
            }
            FeedOutcome::Failed(e @ IngestError::Store { .. }) => {
                error!(error = %e, "Store unavailable, feed skipped this pass");
            }
        }

        outcome
    }

    async fn step(&self, feed_type: FeedType) -> Result<FeedOutcome, IngestError> {
        let Some(event) = self.feeds.fetch(feed_type).await? else {
            return Ok(FeedOutcome::Empty);
        };

        let last_id = self
            .bounded(StoreStage::ReadCursor, self.cursors.get(feed_type))
            .await?;

        if last_id.as_deref() == Some(event.id.as_str()) {
            return Ok(FeedOutcome::Unchanged { event_id: event.id });
        }

        let append = self
            .bounded(StoreStage::AppendHistory, self.history.append(&event))
            .await?;

        // History is confirmed; only now may the cursor move.
        self.bounded(
            StoreStage::AdvanceCursor,
            self.cursors.set(feed_type, &event.id),
        )
        .await?;

        Ok(FeedOutcome::Ingested {
            event_id: event.id,
            append,
        })
    }

    /// Await a store call, giving up after the store timeout.
    async fn bounded<T>(
        &self,
        stage: StoreStage,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, IngestError> {
        let source = match tokio::time::timeout(self.store_timeout, call).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_elapsed) => StoreError::Timeout {
                operation: stage.as_str(),
                after: self.store_timeout,
            },
        };
        Err(IngestError::Store { stage, source })
    }
}
