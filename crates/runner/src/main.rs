use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use episodarr_core::config::{LogFormat, SourceKind, TorrentClientBackend};
use episodarr_core::external_catalog::TmdbClient;
use episodarr_core::library::JellyfinClient;
use episodarr_core::searcher::{PirateBaySearcher, Searcher, TorznabSearcher};
use episodarr_core::torrent_client::{QBittorrentClient, TorrentClient, TransmissionClient};
use episodarr_core::{
    load_config, validate_config, CacheFileDetector, Config, DetectorStrategy, Dispatcher,
    FsShowStore, LibraryDetector, MissingEpisodeDetector, Resolver, SanitizedConfig, ShowStore,
};

#[tokio::main]
async fn main() {
    let config = match load() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.logging.format);

    if let Err(e) = run(config).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

fn load() -> Result<Config> {
    let config_path = std::env::var("EPISODARR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("episodarr.toml"));

    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn run(config: Config) -> Result<()> {
    let sanitized = SanitizedConfig::from(&config);
    info!(config = ?sanitized, "Configuration loaded");

    let searchers = build_searchers(&config)?;
    let torrent_client = build_torrent_client(&config)?;
    let store: Arc<dyn ShowStore> = Arc::new(FsShowStore::new(&config.library.root));
    let detector = build_detector(&config, Arc::clone(&store))?;

    info!(
        detector = detector.name(),
        sources = searchers.len(),
        torrent_client = torrent_client.name(),
        "Starting run"
    );

    let today = Local::now().date_naive();
    let wanted = match detector.detect(today).await {
        Ok(wanted) => wanted,
        Err(e) => {
            error!(detector = detector.name(), error = %e, "Detection failed, nothing to do");
            return Ok(());
        }
    };
    info!(wanted = wanted.len(), "Detection complete");

    let resolver = Resolver::new(config.quality.tiers.clone(), searchers);
    let dispatcher = Dispatcher::new(resolver, torrent_client, store, &config.library.root);
    let summary = dispatcher.dispatch(&wanted, detector.as_ref()).await;

    info!(
        submitted = summary.submitted,
        not_found = summary.not_found,
        skipped = summary.skipped,
        failed = summary.failed,
        "Run complete"
    );

    Ok(())
}

fn build_searchers(config: &Config) -> Result<Vec<Arc<dyn Searcher>>> {
    let mut searchers: Vec<Arc<dyn Searcher>> = Vec::new();

    for kind in &config.sources.order {
        let searcher: Arc<dyn Searcher> = match kind {
            SourceKind::Piratebay => {
                let pb = config
                    .sources
                    .piratebay
                    .clone()
                    .context("sources.piratebay is not configured")?;
                info!("Initializing PirateBay searcher at {}", pb.url);
                Arc::new(PirateBaySearcher::new(pb).context("Failed to create PirateBay searcher")?)
            }
            SourceKind::Torznab => {
                let tz = config
                    .sources
                    .torznab
                    .clone()
                    .context("sources.torznab is not configured")?;
                info!("Initializing Torznab searcher at {}", tz.url);
                Arc::new(TorznabSearcher::new(tz).context("Failed to create Torznab searcher")?)
            }
        };
        searchers.push(searcher);
    }

    Ok(searchers)
}

fn build_torrent_client(config: &Config) -> Result<Arc<dyn TorrentClient>> {
    let tc = &config.torrent_client;
    match tc.backend {
        TorrentClientBackend::Transmission => {
            let tr = tc
                .transmission
                .clone()
                .context("torrent_client.transmission is not configured")?;
            info!("Initializing Transmission client at {}", tr.url);
            Ok(Arc::new(
                TransmissionClient::new(tr).context("Failed to create Transmission client")?,
            ))
        }
        TorrentClientBackend::QBittorrent => {
            let qb = tc
                .qbittorrent
                .clone()
                .context("torrent_client.qbittorrent is not configured")?;
            info!("Initializing qBittorrent client at {}", qb.url);
            Ok(Arc::new(
                QBittorrentClient::new(qb).context("Failed to create qBittorrent client")?,
            ))
        }
    }
}

fn build_detector(
    config: &Config,
    store: Arc<dyn ShowStore>,
) -> Result<Arc<dyn MissingEpisodeDetector>> {
    match config.detector.strategy {
        DetectorStrategy::Library => {
            let ls = config
                .library_service
                .clone()
                .context("library_service is not configured")?;
            info!("Using library detector against {}", ls.url);
            let library =
                JellyfinClient::new(ls).context("Failed to create library service client")?;
            Ok(Arc::new(LibraryDetector::new(Arc::new(library))))
        }
        DetectorStrategy::CacheFile => {
            let tmdb = config.tmdb.clone().context("tmdb is not configured")?;
            info!("Using cache-file detector under {:?}", config.library.root);
            let catalog = TmdbClient::new(tmdb).context("Failed to create TMDB client")?;
            Ok(Arc::new(CacheFileDetector::new(Arc::new(catalog), store)))
        }
    }
}
