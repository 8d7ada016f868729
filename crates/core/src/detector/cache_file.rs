use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};

use crate::episode::WantedEpisode;
use crate::external_catalog::{next_episode_for, ShowCatalog, TmdbEpisode};
use crate::store::{ShowCacheRecord, ShowStore};

use super::{DetectorError, MissingEpisodeDetector};

/// Detector that tracks the next episode of each show folder.
///
/// Every directory under the library root is a show. Its `cached.json`
/// names the next episode to air; a missing or unreadable record is
/// re-derived from the show catalog and written back.
pub struct CacheFileDetector {
    catalog: Arc<dyn ShowCatalog>,
    store: Arc<dyn ShowStore>,
}

impl CacheFileDetector {
    pub fn new(catalog: Arc<dyn ShowCatalog>, store: Arc<dyn ShowStore>) -> Self {
        Self { catalog, store }
    }

    fn record_for(show: &str, next: &TmdbEpisode) -> ShowCacheRecord {
        ShowCacheRecord {
            show: show.to_string(),
            season_number: next.season_number,
            episode_number: next.episode_number,
            air_date: next.air_date.clone(),
        }
    }

    /// Ask the catalog for the show's next episode and cache it.
    async fn seed(&self, show: &str) -> Option<ShowCacheRecord> {
        let next = match next_episode_for(self.catalog.as_ref(), show).await {
            Ok(Some(next)) => next,
            Ok(None) => return None,
            Err(e) => {
                warn!(show = %show, error = %e, "Catalog lookup failed");
                return None;
            }
        };

        let record = Self::record_for(show, &next);
        if let Err(e) = self.store.save_record(&record) {
            warn!(show = %show, error = %e, "Failed to write cache record");
        } else {
            debug!(
                show = %show,
                season = record.season_number,
                episode = record.episode_number,
                "Seeded cache record"
            );
        }
        Some(record)
    }

    async fn load_or_seed(&self, show: &str) -> Option<ShowCacheRecord> {
        match self.store.load_record(show) {
            Ok(Some(record)) => Some(record),
            Ok(None) => self.seed(show).await,
            Err(e) => {
                warn!(show = %show, error = %e, "Unreadable cache record, re-seeding");
                self.seed(show).await
            }
        }
    }
}

#[async_trait]
impl MissingEpisodeDetector for CacheFileDetector {
    fn name(&self) -> &str {
        "cache_file"
    }

    async fn detect(&self, today: NaiveDate) -> Result<Vec<WantedEpisode>, DetectorError> {
        let shows = self.store.list_shows()?;
        let latest = today - Duration::days(1);
        let mut wanted = Vec::new();

        for show in &shows {
            let Some(record) = self.load_or_seed(show).await else {
                info!(show = %show, "No upcoming episode, skipping");
                continue;
            };

            if record.season_number == 0 {
                debug!(show = %show, "Next episode is a special, skipping");
                continue;
            }

            let episode = record.to_wanted();
            if episode.air_date().is_some_and(|d| d > latest) {
                debug!(show = %show, episode = %episode.key(), "Not aired yet");
                continue;
            }

            wanted.push(episode);
        }

        info!(
            shows = shows.len(),
            wanted = wanted.len(),
            "Cache-file detection complete"
        );

        Ok(wanted)
    }

    async fn mark_handled(&self, episode: &WantedEpisode) -> Result<(), DetectorError> {
        match next_episode_for(self.catalog.as_ref(), episode.show()).await? {
            Some(next) => {
                let record = Self::record_for(episode.show(), &next);
                self.store.save_record(&record)?;
                debug!(
                    show = %episode.show(),
                    season = next.season_number,
                    episode = next.episode_number,
                    "Advanced cache record"
                );
            }
            None => {
                self.store.delete_record(episode.show())?;
                debug!(show = %episode.show(), "No further episodes, cache record removed");
            }
        }
        Ok(())
    }
}
