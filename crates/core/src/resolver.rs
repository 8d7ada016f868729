//! Release resolution across the quality ladder and search sources.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::episode::{strip_apostrophes, WantedEpisode};
use crate::quality::QualityLadder;
use crate::searcher::{CandidateFilter, Searcher};

/// The release chosen for a wanted episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRelease {
    /// Magnet URI or .torrent URL.
    pub locator: String,
    /// Ladder tier whose query produced the release.
    pub tier: String,
    pub title: String,
    /// Searcher that returned it.
    pub source: String,
}

/// Search query for one episode at one quality tier,
/// e.g. `"Foos Bar S01E02 2160p"`.
pub fn search_query(episode: &WantedEpisode, tier: &str) -> String {
    format!(
        "{} S{:02}E{:02} {}",
        strip_apostrophes(episode.show()),
        episode.season(),
        episode.episode(),
        tier
    )
}

/// Finds the best acceptable release for an episode.
///
/// Tiers are tried best first; within a tier, searchers in priority order
/// and their candidates in native order. The first candidate that passes the
/// filter wins and nothing further is queried.
pub struct Resolver {
    ladder: QualityLadder,
    searchers: Vec<Arc<dyn Searcher>>,
}

impl Resolver {
    pub fn new(ladder: QualityLadder, searchers: Vec<Arc<dyn Searcher>>) -> Self {
        Self { ladder, searchers }
    }

    pub fn ladder(&self) -> &QualityLadder {
        &self.ladder
    }

    /// Resolve an episode to a release. `None` means nothing acceptable was found.
    pub async fn resolve(&self, episode: &WantedEpisode) -> Option<ResolvedRelease> {
        let filter = match CandidateFilter::new(episode) {
            Ok(filter) => filter,
            Err(e) => {
                warn!(show = %episode.show(), error = %e, "Cannot build name pattern");
                return None;
            }
        };

        for tier in self.ladder.tiers() {
            let query = search_query(episode, tier);

            for searcher in &self.searchers {
                let candidates = match searcher.search(&query).await {
                    Ok(candidates) => candidates,
                    Err(e) => {
                        warn!(
                            source = searcher.name(),
                            query = %query,
                            error = %e,
                            "Search failed, treating as no results"
                        );
                        continue;
                    }
                };

                let caps = searcher.capabilities();
                for candidate in candidates {
                    match filter.accepts(&candidate, &caps) {
                        Ok(()) => {
                            info!(
                                show = %episode.show(),
                                season = episode.season(),
                                episode = episode.episode(),
                                tier = %tier,
                                source = searcher.name(),
                                title = %candidate.title,
                                "Found release"
                            );
                            return Some(ResolvedRelease {
                                locator: candidate.locator,
                                tier: tier.to_string(),
                                title: candidate.title,
                                source: searcher.name().to_string(),
                            });
                        }
                        Err(rejection) => {
                            debug!(
                                title = %candidate.title,
                                source = searcher.name(),
                                reason = rejection.as_str(),
                                "Candidate rejected"
                            );
                        }
                    }
                }
            }

            debug!(show = %episode.show(), tier = %tier, "No release at tier");
        }

        None
    }
}
