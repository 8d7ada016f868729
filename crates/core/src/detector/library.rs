use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};

use crate::episode::WantedEpisode;
use crate::library::{LibraryEpisode, LibraryService};

use super::{DetectorError, MissingEpisodeDetector};

/// Episodes that premiered up to this many days ago are still wanted.
pub const LOOKBACK_DAYS: i64 = 7;

/// Whether a library episode should be acquired on `today`.
///
/// The episode must be a placeholder with a regular season (not specials)
/// that premiered in `[today - 7, today - 1]`. Today's episodes are left for
/// tomorrow's run.
pub fn is_wanted(episode: &LibraryEpisode, today: NaiveDate) -> bool {
    let Some(premiere) = episode.premiere_date else {
        return false;
    };
    if !episode.is_virtual || episode.episode.is_none() {
        return false;
    }
    if !episode.season.is_some_and(|s| s > 0) {
        return false;
    }

    let earliest = today - Duration::days(LOOKBACK_DAYS);
    let latest = today - Duration::days(1);
    premiere >= earliest && premiere <= latest
}

/// Detector backed by the media library's virtual episodes.
pub struct LibraryDetector {
    library: Arc<dyn LibraryService>,
}

impl LibraryDetector {
    pub fn new(library: Arc<dyn LibraryService>) -> Self {
        Self { library }
    }
}

#[async_trait]
impl MissingEpisodeDetector for LibraryDetector {
    fn name(&self) -> &str {
        "library"
    }

    async fn detect(&self, today: NaiveDate) -> Result<Vec<WantedEpisode>, DetectorError> {
        let series = self.library.list_series().await?;
        let mut wanted = Vec::new();

        for s in &series {
            let episodes = match self.library.list_episodes(&s.id).await {
                Ok(episodes) => episodes,
                Err(e) => {
                    warn!(
                        show = %s.name,
                        library = self.library.name(),
                        error = %e,
                        "Failed to list episodes, skipping series"
                    );
                    continue;
                }
            };

            for ep in episodes.iter().filter(|ep| is_wanted(ep, today)) {
                // is_wanted guarantees season, episode and premiere date
                let (Some(season), Some(number)) = (ep.season, ep.episode) else {
                    continue;
                };
                let show = if ep.series_name.is_empty() {
                    s.name.as_str()
                } else {
                    ep.series_name.as_str()
                };

                let episode = WantedEpisode::new(show, season, number, ep.premiere_date);
                debug!(show = %show, season, episode = number, "Episode wanted");
                wanted.push(episode);
            }
        }

        info!(
            series = series.len(),
            wanted = wanted.len(),
            "Library detection complete"
        );

        Ok(wanted)
    }
}
