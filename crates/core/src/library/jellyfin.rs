//! Jellyfin/Emby library client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::LibraryServiceConfig;

use super::{LibraryEpisode, LibraryError, LibraryService, LibrarySeries};

/// Jellyfin (or Emby) REST client.
pub struct JellyfinClient {
    client: Client,
    config: LibraryServiceConfig,
}

impl JellyfinClient {
    /// Create a new Jellyfin client.
    pub fn new(config: LibraryServiceConfig) -> Result<Self, LibraryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| LibraryError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Authenticated GET returning a deserialized body.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, LibraryError> {
        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self
            .client
            .get(&url)
            .header("X-Emby-Token", self.config.api_key.as_str())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LibraryError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| LibraryError::ParseError(format!("{}: {}", endpoint, e)))
    }
}

#[async_trait]
impl LibraryService for JellyfinClient {
    fn name(&self) -> &str {
        "jellyfin"
    }

    async fn list_series(&self) -> Result<Vec<LibrarySeries>, LibraryError> {
        let response: ItemsResponse<SeriesItem> = self
            .get(
                "/Items",
                &[
                    ("IncludeItemTypes", "Series"),
                    ("Recursive", "true"),
                    ("Fields", "ProviderIds"),
                ],
            )
            .await?;

        debug!(series = response.items.len(), "Listed library series");

        Ok(response.items.into_iter().map(Into::into).collect())
    }

    async fn list_episodes(&self, series_id: &str) -> Result<Vec<LibraryEpisode>, LibraryError> {
        let endpoint = format!("/Shows/{}/Episodes", urlencoding::encode(series_id));
        let response: ItemsResponse<EpisodeItem> = self
            .get(&endpoint, &[("Fields", "PremiereDate"), ("IsMissing", "true")])
            .await?;

        debug!(
            series_id = series_id,
            episodes = response.items.len(),
            "Listed library episodes"
        );

        Ok(response.items.into_iter().map(Into::into).collect())
    }
}

/// Premiere dates come as `2024-06-10T00:00:00.0000000Z`; only the date matters.
fn parse_premiere_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

// Jellyfin API response types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SeriesItem {
    id: String,
    name: String,
    #[serde(default)]
    provider_ids: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EpisodeItem {
    #[serde(default)]
    series_name: String,
    parent_index_number: Option<u32>,
    index_number: Option<u32>,
    premiere_date: Option<String>,
    location_type: Option<String>,
}

impl From<SeriesItem> for LibrarySeries {
    fn from(s: SeriesItem) -> Self {
        Self {
            id: s.id,
            name: s.name,
            provider_ids: s.provider_ids,
        }
    }
}

impl From<EpisodeItem> for LibraryEpisode {
    fn from(e: EpisodeItem) -> Self {
        Self {
            series_name: e.series_name,
            season: e.parent_index_number,
            episode: e.index_number,
            premiere_date: e.premiere_date.as_deref().and_then(parse_premiere_date),
            is_virtual: e
                .location_type
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case("virtual")),
        }
    }
}
