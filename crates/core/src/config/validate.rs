use super::{
    types::{Config, DetectorStrategy, SourceKind, TorrentClientBackend},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Library root is set
/// - Quality ladder has at least one non-blank tier
/// - Every source in `sources.order` is configured, and there is at least one
/// - The detector strategy has its collaborator configured
/// - The selected torrent client backend has its section
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.library.root.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "library.root cannot be empty".to_string(),
        ));
    }

    if config.quality.tiers.is_empty() {
        return Err(ConfigError::ValidationError(
            "quality.tiers must list at least one tier".to_string(),
        ));
    }
    if config.quality.tiers.tiers().any(|t| t.trim().is_empty()) {
        return Err(ConfigError::ValidationError(
            "quality.tiers cannot contain blank entries".to_string(),
        ));
    }

    if config.sources.order.is_empty() {
        return Err(ConfigError::ValidationError(
            "sources.order must list at least one source".to_string(),
        ));
    }
    for source in &config.sources.order {
        let configured = match source {
            SourceKind::Piratebay => config.sources.piratebay.is_some(),
            SourceKind::Torznab => config.sources.torznab.is_some(),
        };
        if !configured {
            return Err(ConfigError::ValidationError(format!(
                "sources.order lists '{}' but [sources.{}] is missing",
                source.as_str(),
                source.as_str()
            )));
        }
    }

    match config.detector.strategy {
        DetectorStrategy::Library if config.library_service.is_none() => {
            return Err(ConfigError::ValidationError(
                "detector.strategy = \"library\" requires [library_service]".to_string(),
            ));
        }
        DetectorStrategy::CacheFile if config.tmdb.is_none() => {
            return Err(ConfigError::ValidationError(
                "detector.strategy = \"cache_file\" requires [tmdb]".to_string(),
            ));
        }
        _ => {}
    }

    let backend_configured = match config.torrent_client.backend {
        TorrentClientBackend::Transmission => config.torrent_client.transmission.is_some(),
        TorrentClientBackend::QBittorrent => config.torrent_client.qbittorrent.is_some(),
    };
    if !backend_configured {
        return Err(ConfigError::ValidationError(
            "torrent_client backend selected without its configuration section".to_string(),
        ));
    }

    Ok(())
}
