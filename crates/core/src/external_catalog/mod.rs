//! External show catalog (TMDB).
//!
//! Used by the cache-file detector to find the next episode to air for a
//! show folder that has no cache record yet.

mod tmdb;
mod types;

pub use tmdb::{TmdbClient, TmdbConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when interacting with external catalogs.
#[derive(Debug, Error)]
pub enum ExternalCatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Trait for TV metadata catalogs.
#[async_trait]
pub trait ShowCatalog: Send + Sync {
    /// Search for TV series by name, best match first.
    async fn search_tv(&self, query: &str) -> Result<Vec<TmdbSeries>, ExternalCatalogError>;

    /// Get full details (including the next episode to air) for a series.
    async fn get_tv(&self, tmdb_id: u32) -> Result<TmdbSeries, ExternalCatalogError>;
}

/// Look up the next episode to air for a show by name.
///
/// Returns `Ok(None)` when the show is unknown or has nothing scheduled.
pub async fn next_episode_for(
    catalog: &dyn ShowCatalog,
    show: &str,
) -> Result<Option<TmdbEpisode>, ExternalCatalogError> {
    let Some(first) = catalog.search_tv(show).await?.into_iter().next() else {
        return Ok(None);
    };
    Ok(catalog.get_tv(first.id).await?.next_episode_to_air)
}
