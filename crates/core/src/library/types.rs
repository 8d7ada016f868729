//! Types for library service operations.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur when talking to the library service.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for LibraryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LibraryError::Timeout
        } else if e.is_connect() {
            LibraryError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            LibraryError::ParseError(e.to_string())
        } else {
            LibraryError::ApiError(e.to_string())
        }
    }
}

/// A tracked series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySeries {
    /// Library-internal identifier.
    pub id: String,
    pub name: String,
    /// External IDs (Tmdb, Tvdb, Imdb, ...).
    #[serde(default)]
    pub provider_ids: HashMap<String, String>,
}

/// One episode entry as reported by the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEpisode {
    pub series_name: String,
    /// Season index; `None` when the library has not assigned one.
    pub season: Option<u32>,
    /// Episode index within the season.
    pub episode: Option<u32>,
    pub premiere_date: Option<NaiveDate>,
    /// Placeholder entry with no media file.
    pub is_virtual: bool,
}

/// Trait for media library backends.
#[async_trait]
pub trait LibraryService: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// List every series in the library, with provider IDs.
    async fn list_series(&self) -> Result<Vec<LibrarySeries>, LibraryError>;

    /// List the episodes of one series, including virtual placeholders.
    async fn list_episodes(&self, series_id: &str) -> Result<Vec<LibraryEpisode>, LibraryError>;
}
