//! Types for torrent client operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Torrent rejected: {0}")]
    Rejected(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for TorrentClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TorrentClientError::Timeout
        } else if e.is_connect() {
            TorrentClientError::ConnectionFailed(e.to_string())
        } else {
            TorrentClientError::ApiError(e.to_string())
        }
    }
}

/// Request to add a new torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTorrentRequest {
    /// Magnet URI or URL of a .torrent file.
    pub locator: String,
    /// Optional download path override.
    pub download_path: Option<String>,
}

impl AddTorrentRequest {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            download_path: None,
        }
    }

    /// Set the download path.
    pub fn with_download_path(mut self, path: impl Into<String>) -> Self {
        self.download_path = Some(path.into());
        self
    }
}

/// Result of adding a torrent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddTorrentResult {
    /// Info hash (lowercase hex), when known at submit time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Torrent name (may not be available for magnets until metadata is fetched).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Trait for torrent client implementations.
///
/// Submission is fire-and-forget: once the client accepts a torrent,
/// nothing here tracks its progress.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Returns the name of this client implementation.
    fn name(&self) -> &str;

    /// Add a new torrent.
    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError>;
}

/// Extract the lowercase info hash from a magnet URI.
pub fn extract_hash_from_magnet(magnet: &str) -> Option<String> {
    let (_, params) = magnet.split_once('?')?;
    params
        .split('&')
        .find_map(|param| param.strip_prefix("xt=urn:btih:"))
        .filter(|hash| !hash.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = AddTorrentRequest::new("magnet:?xt=urn:btih:abc")
            .with_download_path("/media/tv/Alpha/Season 2");
        assert_eq!(request.locator, "magnet:?xt=urn:btih:abc");
        assert_eq!(
            request.download_path.as_deref(),
            Some("/media/tv/Alpha/Season 2")
        );

        assert!(AddTorrentRequest::new("https://indexer.example/dl/1.torrent")
            .download_path
            .is_none());
    }

    #[test]
    fn test_extract_hash_from_magnet() {
        assert_eq!(
            extract_hash_from_magnet("magnet:?xt=urn:btih:ABCDEF&dn=Alpha&tr=udp%3A%2F%2Fx"),
            Some("abcdef".to_string())
        );
        assert_eq!(
            extract_hash_from_magnet("magnet:?dn=Alpha&xt=urn:btih:123"),
            Some("123".to_string())
        );
        assert!(extract_hash_from_magnet("magnet:?dn=Alpha").is_none());
        assert!(extract_hash_from_magnet("https://example.com/file.torrent").is_none());
    }
}
