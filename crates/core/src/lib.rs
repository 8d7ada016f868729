pub mod config;
pub mod detector;
pub mod dispatcher;
pub mod episode;
pub mod external_catalog;
pub mod library;
pub mod quality;
pub mod resolver;
pub mod searcher;
pub mod store;
pub mod testing;
pub mod torrent_client;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DetectorStrategy,
    SanitizedConfig,
};
pub use detector::{CacheFileDetector, DetectorError, LibraryDetector, MissingEpisodeDetector};
pub use dispatcher::{download_dir, Dispatcher, RunSummary};
pub use episode::{EpisodeKey, WantedEpisode};
pub use quality::QualityLadder;
pub use resolver::{search_query, ResolvedRelease, Resolver};
pub use store::{show_dir_name, FsShowStore, ShowCacheRecord, ShowStore, StoreError};
