//! Transmission torrent client implementation (JSON-RPC).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::TransmissionConfig;

use super::{
    extract_hash_from_magnet, AddTorrentRequest, AddTorrentResult, TorrentClient,
    TorrentClientError,
};

const SESSION_HEADER: &str = "X-Transmission-Session-Id";

/// Transmission client implementation.
pub struct TransmissionClient {
    client: Client,
    config: TransmissionConfig,
    /// CSRF token handed out by the daemon on HTTP 409.
    session_id: Arc<RwLock<Option<String>>>,
}

impl TransmissionClient {
    /// Create a new Transmission client.
    pub fn new(config: TransmissionConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| {
                TorrentClientError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            session_id: Arc::new(RwLock::new(None)),
        })
    }

    async fn send_rpc(&self, payload: &RpcRequest<'_>) -> Result<Response, TorrentClientError> {
        let mut builder = self.client.post(&self.config.url).json(payload);

        if !self.config.username.is_empty() {
            builder = builder.basic_auth(&self.config.username, Some(&self.config.password));
        }
        if let Some(id) = self.session_id.read().await.as_deref() {
            builder = builder.header(SESSION_HEADER, id);
        }

        Ok(builder.send().await?)
    }

    /// Send an RPC call, doing the session-id handshake once if required.
    async fn call(&self, payload: &RpcRequest<'_>) -> Result<String, TorrentClientError> {
        let mut response = self.send_rpc(payload).await?;

        if response.status() == StatusCode::CONFLICT {
            let id = response
                .headers()
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| {
                    TorrentClientError::ApiError(format!("HTTP 409 without {}", SESSION_HEADER))
                })?;

            debug!("Refreshed Transmission session id");
            *self.session_id.write().await = Some(id);
            response = self.send_rpc(payload).await?;
        }

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(TorrentClientError::AuthenticationFailed(
                    "Invalid credentials".to_string(),
                ))
            }
            status if !status.is_success() => {
                Err(TorrentClientError::ApiError(format!("HTTP {}", status)))
            }
            _ => Ok(response.text().await?),
        }
    }
}

#[async_trait]
impl TorrentClient for TransmissionClient {
    fn name(&self) -> &str {
        "transmission"
    }

    async fn add_torrent(
        &self,
        request: AddTorrentRequest,
    ) -> Result<AddTorrentResult, TorrentClientError> {
        let payload = RpcRequest::torrent_add(&request);
        let body = self.call(&payload).await?;
        let mut result = parse_add_response(&body)?;

        if result.hash.is_none() {
            result.hash = extract_hash_from_magnet(&request.locator);
        }

        debug!(
            locator = %request.locator,
            download_path = ?request.download_path,
            hash = ?result.hash,
            "Torrent added to Transmission"
        );

        Ok(result)
    }
}

// Transmission RPC wire types
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    method: &'static str,
    arguments: TorrentAddArguments<'a>,
}

#[derive(Debug, Serialize)]
struct TorrentAddArguments<'a> {
    filename: &'a str,
    #[serde(rename = "download-dir", skip_serializing_if = "Option::is_none")]
    download_dir: Option<&'a str>,
}

impl<'a> RpcRequest<'a> {
    fn torrent_add(request: &'a AddTorrentRequest) -> Self {
        Self {
            method: "torrent-add",
            arguments: TorrentAddArguments {
                filename: &request.locator,
                download_dir: request.download_path.as_deref(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: String,
    #[serde(default)]
    arguments: Option<TorrentAddResponseArguments>,
}

#[derive(Debug, Deserialize)]
struct TorrentAddResponseArguments {
    #[serde(rename = "torrent-added")]
    added: Option<AddedTorrent>,
    #[serde(rename = "torrent-duplicate")]
    duplicate: Option<AddedTorrent>,
}

#[derive(Debug, Deserialize)]
struct AddedTorrent {
    #[serde(rename = "hashString")]
    hash_string: Option<String>,
    name: Option<String>,
}

fn parse_add_response(body: &str) -> Result<AddTorrentResult, TorrentClientError> {
    let response: RpcResponse = serde_json::from_str(body)
        .map_err(|e| TorrentClientError::ApiError(format!("Invalid RPC response: {}", e)))?;

    if response.result != "success" {
        return Err(TorrentClientError::Rejected(response.result));
    }

    let arguments = response.arguments;
    let torrent = match arguments {
        Some(TorrentAddResponseArguments {
            added: Some(t), ..
        }) => Some(t),
        Some(TorrentAddResponseArguments {
            duplicate: Some(t),
            ..
        }) => {
            warn!(name = ?t.name, "Torrent already present in Transmission");
            Some(t)
        }
        _ => None,
    };

    Ok(torrent
        .map(|t| AddTorrentResult {
            hash: t.hash_string.map(|h| h.to_lowercase()),
            name: t.name,
        })
        .unwrap_or_default())
}
