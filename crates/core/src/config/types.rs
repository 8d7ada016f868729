use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::external_catalog::TmdbConfig;
use crate::quality::QualityLadder;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub library: LibraryConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub library_service: Option<LibraryServiceConfig>,
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
    pub sources: SourcesConfig,
    pub torrent_client: TorrentClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the shows live on disk
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Root folder containing one directory per show.
    /// Downloads land in `{root}/{show}/Season {n}`.
    pub root: PathBuf,
}

/// Missing-episode detection strategy
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetectorStrategy {
    /// Ask the media library for virtual episodes aired in the past week.
    #[default]
    Library,
    /// Track the next episode per show folder via `cached.json`.
    CacheFile,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DetectorConfig {
    #[serde(default)]
    pub strategy: DetectorStrategy,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QualityConfig {
    #[serde(default)]
    pub tiers: QualityLadder,
}

/// Jellyfin/Emby library service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryServiceConfig {
    /// Server URL (e.g., "http://localhost:8096")
    pub url: String,
    /// API key sent as `X-Emby-Token`
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Available search backends
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Piratebay,
    Torznab,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Piratebay => "piratebay",
            SourceKind::Torznab => "torznab",
        }
    }
}

/// Search sources, queried in `order`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    pub order: Vec<SourceKind>,
    #[serde(default)]
    pub piratebay: Option<PirateBayConfig>,
    #[serde(default)]
    pub torznab: Option<TorznabConfig>,
}

/// PirateBay JSON API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PirateBayConfig {
    /// API base URL (default: "https://apibay.org")
    #[serde(default = "default_piratebay_url")]
    pub url: String,
    /// Trackers appended to generated magnet URIs
    #[serde(default = "default_trackers")]
    pub trackers: Vec<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for PirateBayConfig {
    fn default() -> Self {
        Self {
            url: default_piratebay_url(),
            trackers: default_trackers(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_piratebay_url() -> String {
    "https://apibay.org".to_string()
}

fn default_trackers() -> Vec<String> {
    vec![
        "udp://tracker.opentrackr.org:1337/announce".to_string(),
        "udp://open.stealth.si:80/announce".to_string(),
        "udp://tracker.torrent.eu.org:451/announce".to_string(),
    ]
}

/// Torznab feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorznabConfig {
    /// Full Torznab API endpoint
    /// (e.g., "http://localhost:9117/api/v2.0/indexers/all/results/torznab/api")
    pub url: String,
    /// Indexer API key
    pub api_key: String,
    /// Newznab category IDs to request (default: TV)
    #[serde(default = "default_torznab_categories")]
    pub categories: Vec<u32>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_torznab_categories() -> Vec<u32> {
    vec![5000]
}

/// Available torrent client backends
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TorrentClientBackend {
    Transmission,
    #[serde(rename = "qbittorrent")]
    QBittorrent,
}

/// Torrent client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TorrentClientConfig {
    pub backend: TorrentClientBackend,
    #[serde(default)]
    pub transmission: Option<TransmissionConfig>,
    #[serde(default)]
    pub qbittorrent: Option<QBittorrentConfig>,
}

/// Transmission RPC configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransmissionConfig {
    /// RPC endpoint (default: "http://localhost:9091/transmission/rpc")
    #[serde(default = "default_transmission_url")]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_transmission_url() -> String {
    "http://localhost:9091/transmission/rpc".to_string()
}

/// qBittorrent Web API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI URL (e.g., "http://localhost:8080")
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// Sanitized config for the startup log line (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub library_root: PathBuf,
    pub strategy: DetectorStrategy,
    pub tiers: Vec<String>,
    pub sources: Vec<&'static str>,
    pub library_service_url: Option<String>,
    pub tmdb_api_key_configured: bool,
    pub torrent_client: TorrentClientBackend,
    pub torrent_client_credentials_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let credentials = match config.torrent_client.backend {
            TorrentClientBackend::Transmission => config
                .torrent_client
                .transmission
                .as_ref()
                .is_some_and(|t| !t.username.is_empty()),
            TorrentClientBackend::QBittorrent => config
                .torrent_client
                .qbittorrent
                .as_ref()
                .is_some_and(|q| !q.username.is_empty()),
        };

        Self {
            library_root: config.library.root.clone(),
            strategy: config.detector.strategy,
            tiers: config.quality.tiers.tiers().map(str::to_string).collect(),
            sources: config.sources.order.iter().map(SourceKind::as_str).collect(),
            library_service_url: config.library_service.as_ref().map(|l| l.url.clone()),
            tmdb_api_key_configured: config
                .tmdb
                .as_ref()
                .is_some_and(|t| !t.api_key.is_empty()),
            torrent_client: config.torrent_client.backend,
            torrent_client_credentials_configured: credentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[library]
root = "/media/tv"

[sources]
order = ["piratebay"]

[sources.piratebay]

[torrent_client]
backend = "transmission"

[torrent_client.transmission]
"#;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.library.root.to_str().unwrap(), "/media/tv");
        assert_eq!(config.detector.strategy, DetectorStrategy::Library);
        assert_eq!(config.quality.tiers, QualityLadder::default());
        assert_eq!(config.sources.order, vec![SourceKind::Piratebay]);

        let pb = config.sources.piratebay.as_ref().unwrap();
        assert_eq!(pb.url, "https://apibay.org");
        assert_eq!(pb.timeout_secs, 30);
        assert!(!pb.trackers.is_empty());

        let tr = config.torrent_client.transmission.as_ref().unwrap();
        assert_eq!(tr.url, "http://localhost:9091/transmission/rpc");
        assert!(tr.username.is_empty());
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[library]
root = "/media/tv"

[detector]
strategy = "cache_file"

[quality]
tiers = ["2160p", "1080p", "720p"]

[library_service]
url = "http://localhost:8096"
api_key = "jf-key"

[tmdb]
api_key = "tmdb-key"

[sources]
order = ["torznab", "piratebay"]

[sources.torznab]
url = "http://localhost:9117/api/v2.0/indexers/all/results/torznab/api"
api_key = "jackett-key"
timeout_secs = 10

[sources.piratebay]
url = "https://mirror.example"

[torrent_client]
backend = "qbittorrent"

[torrent_client.qbittorrent]
url = "http://localhost:8080"
username = "admin"
password = "secret"

[logging]
format = "json"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.detector.strategy, DetectorStrategy::CacheFile);
        assert_eq!(config.quality.tiers.len(), 3);
        assert_eq!(
            config.sources.order,
            vec![SourceKind::Torznab, SourceKind::Piratebay]
        );
        let torznab = config.sources.torznab.as_ref().unwrap();
        assert_eq!(torznab.categories, vec![5000]);
        assert_eq!(torznab.timeout_secs, 10);
        assert_eq!(config.library_service.as_ref().unwrap().timeout_secs, 30);
        assert_eq!(
            config.torrent_client.backend,
            TorrentClientBackend::QBittorrent
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_deserialize_missing_library_fails() {
        let toml = r#"
[sources]
order = ["piratebay"]

[torrent_client]
backend = "transmission"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        config.torrent_client.transmission.as_mut().unwrap().username = "user".to_string();
        config.torrent_client.transmission.as_mut().unwrap().password = "hunter2".to_string();

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.torrent_client_credentials_configured);
        assert!(!sanitized.tmdb_api_key_configured);
        assert_eq!(sanitized.sources, vec!["piratebay"]);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
