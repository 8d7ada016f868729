//! Hands resolved releases to the torrent client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::detector::MissingEpisodeDetector;
use crate::episode::WantedEpisode;
use crate::resolver::Resolver;
use crate::store::{show_dir_name, ShowStore};
use crate::torrent_client::{AddTorrentRequest, TorrentClient};

/// Per-run outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub submitted: usize,
    pub not_found: usize,
    /// Already submitted on an earlier run.
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.submitted + self.not_found + self.skipped + self.failed
    }
}

/// Download directory for an episode: `{root}/{show}/Season {n}`.
///
/// The show part goes through [`show_dir_name`]; `None` when the name
/// cannot be a folder.
pub fn download_dir(root: &Path, episode: &WantedEpisode) -> Option<PathBuf> {
    let show = show_dir_name(episode.show())?;
    Some(root.join(show).join(format!("Season {}", episode.season())))
}

/// Resolves each wanted episode and submits the winner.
pub struct Dispatcher {
    resolver: Resolver,
    client: Arc<dyn TorrentClient>,
    store: Arc<dyn ShowStore>,
    library_root: PathBuf,
}

impl Dispatcher {
    pub fn new(
        resolver: Resolver,
        client: Arc<dyn TorrentClient>,
        store: Arc<dyn ShowStore>,
        library_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            client,
            store,
            library_root: library_root.into(),
        }
    }

    /// Process episodes in order. Failures are counted, never propagated.
    pub async fn dispatch(
        &self,
        episodes: &[WantedEpisode],
        detector: &dyn MissingEpisodeDetector,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        for episode in episodes {
            let Some(dir) = download_dir(&self.library_root, episode) else {
                warn!(show = %episode.show(), "Show name is not a usable folder name, skipping");
                summary.failed += 1;
                continue;
            };

            match self.store.is_handled(episode) {
                Ok(true) => {
                    info!(show = %episode.show(), episode = %episode.key(), "Already submitted, skipping");
                    // A detector that failed to advance last time gets another go
                    self.mark_detector_handled(episode, detector).await;
                    summary.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(show = %episode.show(), error = %e, "Cannot read handled ledger");
                }
            }

            let Some(release) = self.resolver.resolve(episode).await else {
                info!(
                    show = %episode.show(),
                    season = episode.season(),
                    episode = episode.episode(),
                    "No acceptable release found"
                );
                summary.not_found += 1;
                continue;
            };

            let request = AddTorrentRequest::new(release.locator.clone())
                .with_download_path(dir.to_string_lossy());

            match self.client.add_torrent(request).await {
                Ok(result) => {
                    info!(
                        show = %episode.show(),
                        season = episode.season(),
                        episode = episode.episode(),
                        tier = %release.tier,
                        source = %release.source,
                        client = self.client.name(),
                        hash = ?result.hash,
                        download_dir = %dir.display(),
                        "Submitted release"
                    );
                    summary.submitted += 1;
                }
                Err(e) => {
                    warn!(
                        show = %episode.show(),
                        episode = %episode.key(),
                        client = self.client.name(),
                        error = %e,
                        "Failed to submit release"
                    );
                    summary.failed += 1;
                    continue;
                }
            }

            if let Err(e) = self.store.mark_handled(episode) {
                warn!(show = %episode.show(), error = %e, "Failed to record handled episode");
            }
            self.mark_detector_handled(episode, detector).await;
        }

        summary
    }

    async fn mark_detector_handled(
        &self,
        episode: &WantedEpisode,
        detector: &dyn MissingEpisodeDetector,
    ) {
        if let Err(e) = detector.mark_handled(episode).await {
            warn!(
                show = %episode.show(),
                detector = detector.name(),
                error = %e,
                "Detector failed to mark episode handled"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectorError;
    use crate::quality::QualityLadder;
    use crate::searcher::{Published, Searcher};
    use crate::testing::{fixtures, MemoryShowStore, MockSearcher, MockTorrentClient};
    use crate::torrent_client::TorrentClientError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Records `mark_handled` calls.
    #[derive(Default)]
    struct RecordingDetector {
        handled: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MissingEpisodeDetector for RecordingDetector {
        fn name(&self) -> &str {
            "recording"
        }

        async fn detect(&self, _today: NaiveDate) -> Result<Vec<WantedEpisode>, DetectorError> {
            Ok(Vec::new())
        }

        async fn mark_handled(&self, episode: &WantedEpisode) -> Result<(), DetectorError> {
            self.handled.lock().unwrap().push(episode.to_string());
            Ok(())
        }
    }

    fn air_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    async fn searcher_with_alpha() -> Arc<MockSearcher> {
        let searcher = Arc::new(MockSearcher::new("mock"));
        searcher
            .set_query_handler(|query| {
                query.starts_with("Alpha ").then(|| {
                    vec![fixtures::trusted_candidate(
                        "Alpha S02E05 1080p",
                        "magnet:?xt=urn:btih:alpha",
                        Published::Date(air_date()),
                    )]
                })
            })
            .await;
        searcher
    }

    fn dispatcher(
        searcher: Arc<MockSearcher>,
        client: Arc<MockTorrentClient>,
        store: Arc<MemoryShowStore>,
    ) -> Dispatcher {
        let searchers: Vec<Arc<dyn Searcher>> = vec![searcher];
        Dispatcher::new(
            Resolver::new(QualityLadder::new(["1080p"]), searchers),
            client,
            store,
            "/media/tv",
        )
    }

    #[test]
    fn test_download_dir() {
        let ep = WantedEpisode::new("Alpha", 2, 5, None);
        assert_eq!(
            download_dir(Path::new("/media/tv"), &ep),
            Some(PathBuf::from("/media/tv/Alpha/Season 2"))
        );

        let ep = WantedEpisode::new("Face/Off", 1, 3, None);
        assert_eq!(
            download_dir(Path::new("/media/tv"), &ep),
            Some(PathBuf::from("/media/tv/Face-Off/Season 1"))
        );

        let ep = WantedEpisode::new("..", 1, 1, None);
        assert!(download_dir(Path::new("/media/tv"), &ep).is_none());
    }

    #[tokio::test]
    async fn test_unusable_show_name_is_not_submitted() {
        let client = Arc::new(MockTorrentClient::new());
        let store = Arc::new(MemoryShowStore::new());
        let searcher = Arc::new(MockSearcher::new("mock"));
        let dispatcher = dispatcher(searcher.clone(), client.clone(), store);

        let episode = WantedEpisode::new("..", 2, 5, Some(air_date()));
        let summary = dispatcher
            .dispatch(&[episode], &RecordingDetector::default())
            .await;

        assert_eq!(summary.failed, 1);
        assert!(searcher.recorded_queries().await.is_empty());
        assert!(client.added_torrents().await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_counts_outcomes() {
        let client = Arc::new(MockTorrentClient::new());
        let store = Arc::new(MemoryShowStore::new());
        let dispatcher = dispatcher(searcher_with_alpha().await, client.clone(), store.clone());
        let detector = RecordingDetector::default();

        let episodes = vec![
            WantedEpisode::new("Alpha", 2, 5, Some(air_date())),
            WantedEpisode::new("Beta", 1, 1, Some(air_date())),
        ];
        let summary = dispatcher.dispatch(&episodes, &detector).await;

        assert_eq!(
            summary,
            RunSummary {
                submitted: 1,
                not_found: 1,
                skipped: 0,
                failed: 0
            }
        );

        let added = client.added_torrents().await;
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].locator, "magnet:?xt=urn:btih:alpha");
        assert_eq!(added[0].download_path.as_deref(), Some("/media/tv/Alpha/Season 2"));

        assert!(store.is_handled(&episodes[0]).unwrap());
        assert!(!store.is_handled(&episodes[1]).unwrap());
        assert_eq!(*detector.handled.lock().unwrap(), vec!["Alpha S02E05"]);
    }

    #[tokio::test]
    async fn test_dispatch_skips_handled() {
        let client = Arc::new(MockTorrentClient::new());
        let store = Arc::new(MemoryShowStore::new());
        let episode = WantedEpisode::new("Alpha", 2, 5, Some(air_date()));
        store.mark_handled(&episode).unwrap();

        let searcher = searcher_with_alpha().await;
        let dispatcher = dispatcher(searcher.clone(), client.clone(), store);
        let detector = RecordingDetector::default();
        let summary = dispatcher.dispatch(&[episode], &detector).await;

        assert_eq!(summary.skipped, 1);
        assert!(client.added_torrents().await.is_empty());
        assert!(searcher.recorded_queries().await.is_empty());
        // The detector still gets to advance past a skipped episode
        assert_eq!(*detector.handled.lock().unwrap(), vec!["Alpha S02E05"]);
    }

    #[tokio::test]
    async fn test_submit_failure_leaves_episode_pending() {
        let client = Arc::new(MockTorrentClient::new());
        client
            .set_next_error(TorrentClientError::ConnectionFailed("refused".to_string()))
            .await;
        let store = Arc::new(MemoryShowStore::new());
        let dispatcher = dispatcher(searcher_with_alpha().await, client.clone(), store.clone());
        let detector = RecordingDetector::default();

        let episode = WantedEpisode::new("Alpha", 2, 5, Some(air_date()));
        let summary = dispatcher
            .dispatch(std::slice::from_ref(&episode), &detector)
            .await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total(), 1);
        assert!(!store.is_handled(&episode).unwrap());
        assert!(detector.handled.lock().unwrap().is_empty());

        // The error was one-shot; the next run succeeds
        let summary = dispatcher
            .dispatch(std::slice::from_ref(&episode), &detector)
            .await;
        assert_eq!(summary.submitted, 1);
    }
}
