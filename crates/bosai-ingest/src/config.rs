//! Configuration for the ingestion binary.
//!
//! All configuration is loaded from environment variables. Parsing goes
//! through [`IngestConfig::from_lookup`], which takes the variable source as a
//! function so tests never touch the process environment.

use std::str::FromStr;
use std::time::Duration;

use bosai_types::FeedType;

use crate::error::ConfigError;
use crate::feed::{DEFAULT_FEED_BASE_URL, DEFAULT_FEED_TIMEOUT_SECS, FeedClientConfig};
use crate::orchestrator::{DEFAULT_STORE_TIMEOUT_SECS, OrchestratorConfig};

/// Cursor database used when `CURSOR_URL` is unset.
pub const DEFAULT_CURSOR_URL: &str = "sqlite://disaster.db?mode=rwc";

/// Default `PostgreSQL` pool size.
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Complete ingestion configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// `PostgreSQL` URL of the history store.
    pub database_url: String,
    /// URL of the cursor store (`sqlite:` or `redis:`).
    pub cursor_url: String,
    /// Feed client settings.
    pub feed: FeedClientConfig,
    /// Feeds polled by each pass.
    pub feed_types: Vec<FeedType>,
    /// Upper bound on each store call.
    pub store_timeout: Duration,
    /// Maximum `PostgreSQL` connections.
    pub db_max_connections: u32,
    /// Log output format.
    pub log_format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `text` or `json`, got `{other}`")),
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `DATABASE_URL` -- `PostgreSQL` history store
    ///
    /// Optional variables:
    /// - `CURSOR_URL` -- cursor store (default `sqlite://disaster.db?mode=rwc`)
    /// - `FEED_BASE_URL` -- feed host (default `https://www.jma.go.jp`)
    /// - `FEED_TYPES` -- comma-separated feeds (default all three)
    /// - `FEED_TIMEOUT_SECS` -- HTTP timeout (default 10)
    /// - `STORE_TIMEOUT_SECS` -- per store-call timeout (default 5)
    /// - `DB_MAX_CONNECTIONS` -- `PostgreSQL` pool size (default 5)
    /// - `LOG_FORMAT` -- `text` or `json` (default `text`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let cursor_url = get("CURSOR_URL").unwrap_or_else(|| DEFAULT_CURSOR_URL.to_owned());
        let base_url = get("FEED_BASE_URL").unwrap_or_else(|| DEFAULT_FEED_BASE_URL.to_owned());

        let feed_types = match get("FEED_TYPES") {
            Some(raw) => parse_feed_types(&raw)?,
            None => FeedType::ALL.to_vec(),
        };

        let feed_timeout_secs: u64 =
            parse_or("FEED_TIMEOUT_SECS", get("FEED_TIMEOUT_SECS"), DEFAULT_FEED_TIMEOUT_SECS)?;
        let store_timeout_secs: u64 = parse_or(
            "STORE_TIMEOUT_SECS",
            get("STORE_TIMEOUT_SECS"),
            DEFAULT_STORE_TIMEOUT_SECS,
        )?;
        let db_max_connections: u32 = parse_or(
            "DB_MAX_CONNECTIONS",
            get("DB_MAX_CONNECTIONS"),
            DEFAULT_DB_MAX_CONNECTIONS,
        )?;
        let log_format: LogFormat = parse_or("LOG_FORMAT", get("LOG_FORMAT"), LogFormat::Text)?;

        if feed_timeout_secs == 0 {
            return Err(invalid("FEED_TIMEOUT_SECS", "must be at least 1"));
        }
        if store_timeout_secs == 0 {
            return Err(invalid("STORE_TIMEOUT_SECS", "must be at least 1"));
        }
        if db_max_connections == 0 {
            return Err(invalid("DB_MAX_CONNECTIONS", "must be at least 1"));
        }

        Ok(Self {
            database_url,
            cursor_url,
            feed: FeedClientConfig {
                base_url,
                timeout: Duration::from_secs(feed_timeout_secs),
                ..FeedClientConfig::default()
            },
            feed_types,
            store_timeout: Duration::from_secs(store_timeout_secs),
            db_max_connections,
            log_format,
        })
    }

    /// Orchestrator settings derived from this configuration.
    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            feed_types: self.feed_types.clone(),
            store_timeout: self.store_timeout,
        }
    }
}

/// Parse a comma-separated feed list.
///
/// The list must name at least one feed and may not repeat one.
pub fn parse_feed_types(raw: &str) -> Result<Vec<FeedType>, ConfigError> {
    let mut feeds = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let feed: FeedType = part
            .parse()
            .map_err(|e: bosai_types::UnknownFeedType| invalid("FEED_TYPES", &e.to_string()))?;
        if feeds.contains(&feed) {
            return Err(invalid("FEED_TYPES", &format!("{feed} listed twice")));
        }
        feeds.push(feed);
    }
    if feeds.is_empty() {
        return Err(invalid("FEED_TYPES", "no feed types listed"));
    }
    Ok(feeds)
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |value| {
        value
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(name, &e.to_string()))
    })
}

fn invalid(name: &'static str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        message: message.to_owned(),
    }
}
