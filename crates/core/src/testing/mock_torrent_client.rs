//! Mock torrent client for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::torrent_client::{
    extract_hash_from_magnet, AddTorrentRequest, AddTorrentResult, TorrentClient,
    TorrentClientError,
};

/// Mock implementation of the TorrentClient trait.
///
/// Records every accepted request and can be told to fail the next one.
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::new();
/// client.add_torrent(AddTorrentRequest::new("magnet:?...")).await?;
///
/// let added = client.added_torrents().await;
/// assert_eq!(added.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    /// Accepted add_torrent requests.
    added: Arc<RwLock<Vec<AddTorrentRequest>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
}

impl MockTorrentClient {
    /// Create a new mock torrent client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all accepted add_torrent requests.
    pub async fn added_torrents(&self) -> Vec<AddTorrentRequest> {
        self.added.read().await.clone()
    }

    /// Configure the next add to fail with the given error.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let result = AddTorrentResult {
            hash: extract_hash_from_magnet(&request.locator),
            name: None,
        };
        self.added.write().await.push(request);
        Ok(result)
    }
}
