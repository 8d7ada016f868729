//! Mock show catalog for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::external_catalog::{ExternalCatalogError, ShowCatalog, TmdbSeries};

/// A recorded catalog query for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCatalogQuery {
    SearchTv { query: String },
    GetTv { tmdb_id: u32 },
}

/// Mock implementation of the ShowCatalog trait.
///
/// `search_tv` returns every series whose name contains the query
/// (case-insensitive), in insertion order.
///
/// # Example
///
/// ```rust,ignore
/// use episodarr_core::testing::{MockShowCatalog, fixtures};
///
/// let catalog = MockShowCatalog::new();
/// catalog.add_series(fixtures::tmdb_series(1, "Alpha", Some((2, 5, "2024-06-10")))).await;
///
/// let results = catalog.search_tv("alpha").await?;
/// assert_eq!(results.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockShowCatalog {
    series: Arc<RwLock<Vec<TmdbSeries>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<RecordedCatalogQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ExternalCatalogError>>>,
}

impl MockShowCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a series, replacing any existing one with the same ID.
    pub async fn add_series(&self, series: TmdbSeries) {
        let mut all = self.series.write().await;
        match all.iter_mut().find(|s| s.id == series.id) {
            Some(existing) => *existing = series,
            None => all.push(series),
        }
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ExternalCatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.queries.read().await.clone()
    }

    async fn check_error(&self) -> Result<(), ExternalCatalogError> {
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ShowCatalog for MockShowCatalog {
    async fn search_tv(&self, query: &str) -> Result<Vec<TmdbSeries>, ExternalCatalogError> {
        self.queries.write().await.push(RecordedCatalogQuery::SearchTv {
            query: query.to_string(),
        });
        self.check_error().await?;

        let needle = query.to_lowercase();
        Ok(self
            .series
            .read()
            .await
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .map(|s| TmdbSeries {
                // Search results never carry the next episode
                next_episode_to_air: None,
                ..s.clone()
            })
            .collect())
    }

    async fn get_tv(&self, tmdb_id: u32) -> Result<TmdbSeries, ExternalCatalogError> {
        self.queries
            .write()
            .await
            .push(RecordedCatalogQuery::GetTv { tmdb_id });
        self.check_error().await?;

        self.series
            .read()
            .await
            .iter()
            .find(|s| s.id == tmdb_id)
            .cloned()
            .ok_or_else(|| ExternalCatalogError::NotFound(format!("TV series ID {}", tmdb_id)))
    }
}
