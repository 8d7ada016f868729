//! Detection → resolution → dispatch integration tests.
//!
//! These tests run a full acquisition pass against mock collaborators and a
//! filesystem show store in a temp dir.

use std::fs;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

use episodarr_core::{
    external_catalog::ExternalCatalogError,
    searcher::{Published, Searcher},
    testing::{fixtures, MockLibraryService, MockSearcher, MockShowCatalog, MockTorrentClient},
    CacheFileDetector, Dispatcher, FsShowStore, LibraryDetector, MissingEpisodeDetector,
    QualityLadder, Resolver, RunSummary, ShowCacheRecord, ShowStore,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 13).unwrap()
}

/// Test helper wiring mocks around a temp library root.
struct TestHarness {
    searcher: Arc<MockSearcher>,
    torrent_client: Arc<MockTorrentClient>,
    store: Arc<FsShowStore>,
    temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(FsShowStore::new(temp_dir.path()));

        // A trusted 1080p release dated yesterday, for any Alpha S02E05 query at 1080p
        let searcher = Arc::new(MockSearcher::new("mock-indexer"));
        searcher
            .set_query_handler(|query| {
                (query == "Alpha S02E05 1080p").then(|| {
                    vec![fixtures::trusted_candidate(
                        "Alpha.S02E05.1080p.WEB.h264-GRP",
                        "magnet:?xt=urn:btih:a1b2c3",
                        Published::Date(today() - Duration::days(1)),
                    )]
                })
            })
            .await;

        Self {
            searcher,
            torrent_client: Arc::new(MockTorrentClient::new()),
            store,
            temp_dir,
        }
    }

    fn dispatcher(&self) -> Dispatcher {
        let searchers: Vec<Arc<dyn Searcher>> = vec![self.searcher.clone()];
        Dispatcher::new(
            Resolver::new(QualityLadder::default(), searchers),
            self.torrent_client.clone(),
            self.store.clone(),
            self.temp_dir.path(),
        )
    }

    async fn library_detector(&self) -> LibraryDetector {
        let library = Arc::new(MockLibraryService::new());
        library
            .add_series(
                fixtures::library_series("a1", "Alpha"),
                vec![
                    fixtures::library_episode(
                        "Alpha",
                        Some(2),
                        Some(4),
                        Some(today() - Duration::days(10)),
                        true,
                    ),
                    fixtures::library_episode(
                        "Alpha",
                        Some(2),
                        Some(5),
                        Some(today() - Duration::days(3)),
                        true,
                    ),
                ],
            )
            .await;
        LibraryDetector::new(library)
    }

    async fn run(&self, detector: &dyn MissingEpisodeDetector) -> RunSummary {
        let wanted = detector.detect(today()).await.expect("detection failed");
        self.dispatcher().dispatch(&wanted, detector).await
    }
}

#[tokio::test]
async fn test_end_to_end_library_strategy() {
    let harness = TestHarness::new().await;
    let detector = harness.library_detector().await;

    let summary = harness.run(&detector).await;
    assert_eq!(summary.submitted, 1);
    assert_eq!(summary.total(), 1);

    let added = harness.torrent_client.added_torrents().await;
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].locator, "magnet:?xt=urn:btih:a1b2c3");

    let expected_dir = harness.temp_dir.path().join("Alpha").join("Season 2");
    assert_eq!(
        added[0].download_path.as_deref(),
        expected_dir.to_str()
    );

    // Every tier was tried best first until 1080p matched
    assert_eq!(
        harness.searcher.recorded_queries().await,
        vec![
            "Alpha S02E05 HDR 2160p",
            "Alpha S02E05 2160p",
            "Alpha S02E05 1080p"
        ]
    );
}

#[tokio::test]
async fn test_dispatching_twice_submits_once() {
    let harness = TestHarness::new().await;
    let detector = harness.library_detector().await;

    let first = harness.run(&detector).await;
    let second = harness.run(&detector).await;

    assert_eq!(first.submitted, 1);
    assert_eq!(second.submitted, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(harness.torrent_client.added_torrents().await.len(), 1);
    assert!(harness
        .temp_dir
        .path()
        .join("Alpha")
        .join("resolved.json")
        .exists());
}

#[tokio::test]
async fn test_end_to_end_cache_file_strategy() {
    let harness = TestHarness::new().await;
    fs::create_dir(harness.temp_dir.path().join("Alpha")).unwrap();
    fs::create_dir(harness.temp_dir.path().join("Beta")).unwrap();

    let catalog = Arc::new(MockShowCatalog::new());
    catalog
        .add_series(fixtures::tmdb_series(1, "Alpha", Some((2, 5, "2024-06-10"))))
        .await;
    catalog
        .add_series(fixtures::tmdb_series(2, "Beta", Some((1, 1, "2024-07-01"))))
        .await;

    let detector = CacheFileDetector::new(catalog.clone(), harness.store.clone());
    let wanted = detector.detect(today()).await.unwrap();
    assert_eq!(wanted.len(), 1);
    assert_eq!(wanted[0].to_string(), "Alpha S02E05");

    // Both shows were seeded, Beta has not aired yet
    assert!(harness.store.load_record("Beta").unwrap().is_some());

    // TMDB moves on once the episode is out
    catalog
        .add_series(fixtures::tmdb_series(1, "Alpha", Some((2, 6, "2024-06-17"))))
        .await;

    let summary = harness.dispatcher().dispatch(&wanted, &detector).await;
    assert_eq!(summary.submitted, 1);

    let record = harness.store.load_record("Alpha").unwrap().unwrap();
    assert_eq!((record.season_number, record.episode_number), (2, 6));

    // Next run: S02E06 airs in the future, nothing to do
    assert!(detector.detect(today()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cache_record_advances_after_catalog_error() {
    let harness = TestHarness::new().await;
    fs::create_dir(harness.temp_dir.path().join("Alpha")).unwrap();

    let catalog = Arc::new(MockShowCatalog::new());
    catalog
        .add_series(fixtures::tmdb_series(1, "Alpha", Some((2, 6, "2024-06-11"))))
        .await;
    let detector = CacheFileDetector::new(catalog.clone(), harness.store.clone());
    harness
        .store
        .save_record(&ShowCacheRecord {
            show: "Alpha".to_string(),
            season_number: 2,
            episode_number: 5,
            air_date: Some("2024-06-10".to_string()),
        })
        .unwrap();

    // TMDB is rate limited right when the record should advance
    catalog.set_next_error(ExternalCatalogError::RateLimitExceeded).await;
    let first = harness.run(&detector).await;
    assert_eq!(first.submitted, 1);
    let record = harness.store.load_record("Alpha").unwrap().unwrap();
    assert_eq!((record.season_number, record.episode_number), (2, 5));

    // Next run skips the submitted episode but still advances the record
    let second = harness.run(&detector).await;
    assert_eq!(second.skipped, 1);
    assert_eq!(second.submitted, 0);
    let record = harness.store.load_record("Alpha").unwrap().unwrap();
    assert_eq!((record.season_number, record.episode_number), (2, 6));

    let wanted = detector.detect(today()).await.unwrap();
    let names: Vec<String> = wanted.iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["Alpha S02E06"]);
    assert_eq!(harness.torrent_client.added_torrents().await.len(), 1);
}

#[tokio::test]
async fn test_no_release_leaves_episode_pending() {
    let harness = TestHarness::new().await;
    let library = Arc::new(MockLibraryService::new());
    library
        .add_series(
            fixtures::library_series("g1", "Gamma"),
            vec![fixtures::library_episode(
                "Gamma",
                Some(1),
                Some(3),
                Some(today() - Duration::days(2)),
                true,
            )],
        )
        .await;
    let detector = LibraryDetector::new(library);

    let summary = harness.run(&detector).await;
    assert_eq!(summary.not_found, 1);
    assert!(harness.torrent_client.added_torrents().await.is_empty());

    let episode = detector.detect(today()).await.unwrap().remove(0);
    assert!(!harness.store.is_handled(&episode).unwrap());
}
