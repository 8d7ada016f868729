//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{TmdbEpisode, TmdbSeries};
use super::{ExternalCatalogError, ShowCatalog};

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    /// Can also be supplied through the `TMDB_API_KEY` environment variable.
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Result<Self, ExternalCatalogError> {
        if config.api_key.is_empty() {
            return Err(ExternalCatalogError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let base_url = config
            .base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }

    /// Map non-success statuses to catalog errors.
    async fn check_status(
        response: reqwest::Response,
        what: impl FnOnce() -> String,
    ) -> Result<reqwest::Response, ExternalCatalogError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::UNAUTHORIZED => Err(ExternalCatalogError::NotConfigured(
                "Invalid TMDB API key".to_string(),
            )),
            StatusCode::NOT_FOUND => Err(ExternalCatalogError::NotFound(what())),
            StatusCode::TOO_MANY_REQUESTS => Err(ExternalCatalogError::RateLimitExceeded),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(ExternalCatalogError::ApiError {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }
}

#[async_trait]
impl ShowCatalog for TmdbClient {
    async fn search_tv(&self, query: &str) -> Result<Vec<TmdbSeries>, ExternalCatalogError> {
        let url = format!("{}/search/tv", self.base_url);

        debug!("TMDB TV search: query='{}'", query);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", query)])
            .send()
            .await?;
        let response = Self::check_status(response, || format!("TV search '{}'", query)).await?;

        let search_result: TmdbSearchResponse<TmdbTvResult> =
            response.json().await.map_err(|e| {
                ExternalCatalogError::ParseError(format!(
                    "Failed to parse TV search response: {}",
                    e
                ))
            })?;

        Ok(search_result
            .results
            .into_iter()
            .map(|r| r.into())
            .collect())
    }

    async fn get_tv(&self, tmdb_id: u32) -> Result<TmdbSeries, ExternalCatalogError> {
        let url = format!("{}/tv/{}", self.base_url, tmdb_id);

        debug!("TMDB get TV: id={}", tmdb_id);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", &self.api_key)])
            .send()
            .await?;
        let response = Self::check_status(response, || format!("TV series ID {}", tmdb_id)).await?;

        let series: TmdbTvDetails = response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!("Failed to parse TV response: {}", e))
        })?;

        Ok(series.into())
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvResult {
    id: u32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbTvDetails {
    id: u32,
    name: String,
    next_episode_to_air: Option<TmdbEpisodeResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbEpisodeResult {
    season_number: u32,
    episode_number: u32,
    name: Option<String>,
    air_date: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<TmdbTvResult> for TmdbSeries {
    fn from(r: TmdbTvResult) -> Self {
        Self {
            id: r.id,
            name: r.name,
            next_episode_to_air: None,
        }
    }
}

impl From<TmdbTvDetails> for TmdbSeries {
    fn from(d: TmdbTvDetails) -> Self {
        Self {
            id: d.id,
            name: d.name,
            next_episode_to_air: d.next_episode_to_air.map(|e| e.into()),
        }
    }
}

impl From<TmdbEpisodeResult> for TmdbEpisode {
    fn from(e: TmdbEpisodeResult) -> Self {
        Self {
            season_number: e.season_number,
            episode_number: e.episode_number,
            name: e.name,
            air_date: e.air_date.filter(|d| !d.is_empty()),
        }
    }
}
