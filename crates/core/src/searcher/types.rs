//! Types for the torrent search system.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upload/publish time as reported by an indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Published {
    /// The source does not report a publish time for this result.
    NotExposed,
    /// Month and day only (listing pages that omit the current year).
    MonthDay { month: u32, day: u32 },
    /// Calendar date without time.
    Date(NaiveDate),
    /// Full timestamp.
    DateTime(DateTime<Utc>),
    /// The source sent something we could not parse.
    Malformed(String),
}

/// Trust markers some indexers attach to uploaders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustFlags {
    pub trusted: bool,
    pub vip: bool,
}

impl TrustFlags {
    pub fn is_trusted_or_vip(&self) -> bool {
        self.trusted || self.vip
    }
}

/// A raw search result from a single source, before filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Release title as listed by the source.
    pub title: String,
    /// Magnet URI or .torrent URL.
    pub locator: String,
    /// When the release was uploaded.
    pub published: Published,
    /// Uploader trust markers.
    #[serde(default)]
    pub trust: TrustFlags,
    /// Category code or description as reported by the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Which source returned this result.
    pub source: String,
}

/// How precisely a source reports publish times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateGranularity {
    /// No publish time at all.
    None,
    /// Month and day without year.
    MonthDay,
    /// Full calendar date.
    Date,
    /// Date and time; time-less values are considered malformed.
    DateTime,
}

/// What a source's results can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCapabilities {
    pub dates: DateGranularity,
    /// Whether trusted/VIP flags are meaningful for this source.
    pub trust_signals: bool,
    /// Whether results carry a category worth checking.
    pub categories: bool,
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Failed to parse search response: {0}")]
    ParseError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_connect() {
            SearchError::ConnectionFailed(e.to_string())
        } else {
            SearchError::ApiError(e.to_string())
        }
    }
}

/// Trait for torrent search backends.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// What the filter may rely on for this source's results.
    fn capabilities(&self) -> SourceCapabilities;

    /// Run a free-text query. Results keep the source's native order.
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, SearchError>;
}
