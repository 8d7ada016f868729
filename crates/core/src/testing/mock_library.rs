//! Mock library service for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::library::{LibraryEpisode, LibraryError, LibraryService, LibrarySeries};

/// Mock implementation of the LibraryService trait.
///
/// Series are returned in insertion order. Episode listing can be made to
/// fail per series to exercise failure isolation.
#[derive(Debug, Default)]
pub struct MockLibraryService {
    series: Arc<RwLock<Vec<LibrarySeries>>>,
    /// Episodes by series ID.
    episodes: Arc<RwLock<HashMap<String, Vec<LibraryEpisode>>>>,
    /// Per-series listing failures.
    episode_errors: Arc<RwLock<HashMap<String, LibraryError>>>,
    /// If set, the next `list_series` call will fail with this error.
    next_error: Arc<RwLock<Option<LibraryError>>>,
}

impl MockLibraryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a series with its episodes.
    pub async fn add_series(&self, series: LibrarySeries, episodes: Vec<LibraryEpisode>) {
        self.episodes
            .write()
            .await
            .insert(series.id.clone(), episodes);
        self.series.write().await.push(series);
    }

    /// Make `list_episodes` fail once for the given series.
    pub async fn fail_episodes_for(&self, series_id: &str, error: LibraryError) {
        self.episode_errors
            .write()
            .await
            .insert(series_id.to_string(), error);
    }

    /// Configure the next `list_series` call to fail.
    pub async fn set_next_error(&self, error: LibraryError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl LibraryService for MockLibraryService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_series(&self) -> Result<Vec<LibrarySeries>, LibraryError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self.series.read().await.clone())
    }

    async fn list_episodes(&self, series_id: &str) -> Result<Vec<LibraryEpisode>, LibraryError> {
        if let Some(error) = self.episode_errors.write().await.remove(series_id) {
            return Err(error);
        }
        Ok(self
            .episodes
            .read()
            .await
            .get(series_id)
            .cloned()
            .unwrap_or_default())
    }
}
