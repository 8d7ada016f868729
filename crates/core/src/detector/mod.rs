//! Missing-episode detection.
//!
//! Two strategies decide which episodes should be acquired:
//! - [`LibraryDetector`]: virtual episodes the media library reports as
//!   aired within the past week.
//! - [`CacheFileDetector`]: one pending episode per show folder, tracked in
//!   `cached.json` and seeded from the show catalog.

mod cache_file;
mod library;

pub use cache_file::CacheFileDetector;
pub use library::{is_wanted, LibraryDetector, LOOKBACK_DAYS};

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::episode::WantedEpisode;
use crate::external_catalog::ExternalCatalogError;
use crate::library::LibraryError;
use crate::store::StoreError;

/// Errors that stop a detection pass as a whole.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Library service error: {0}")]
    Library(#[from] LibraryError),

    #[error("Show catalog error: {0}")]
    Catalog(#[from] ExternalCatalogError),

    #[error("Show store error: {0}")]
    Store(#[from] StoreError),
}

/// Strategy producing the episodes to acquire on this run.
#[async_trait]
pub trait MissingEpisodeDetector: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &str;

    /// Episodes wanted as of `today`, in detection order.
    async fn detect(&self, today: NaiveDate) -> Result<Vec<WantedEpisode>, DetectorError>;

    /// Called after `episode` was submitted to the torrent client.
    async fn mark_handled(&self, _episode: &WantedEpisode) -> Result<(), DetectorError> {
        Ok(())
    }
}
