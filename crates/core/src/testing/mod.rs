//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every collaborator trait,
//! so detection, resolution and dispatch can be tested without real
//! indexers, libraries or download clients.
//!
//! # Example
//!
//! ```rust,ignore
//! use episodarr_core::testing::{MockSearcher, MockTorrentClient, MemoryShowStore};
//!
//! let searcher = MockSearcher::new("mock");
//! let client = MockTorrentClient::new();
//! let store = MemoryShowStore::new();
//!
//! // Configure mock responses
//! searcher.set_results(vec![/* candidates */]).await;
//! ```

mod memory_store;
mod mock_library;
mod mock_searcher;
mod mock_show_catalog;
mod mock_torrent_client;

pub use memory_store::MemoryShowStore;
pub use mock_library::MockLibraryService;
pub use mock_searcher::MockSearcher;
pub use mock_show_catalog::{MockShowCatalog, RecordedCatalogQuery};
pub use mock_torrent_client::MockTorrentClient;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::NaiveDate;
    use std::collections::HashMap;

    use crate::external_catalog::{TmdbEpisode, TmdbSeries};
    use crate::library::{LibraryEpisode, LibrarySeries};
    use crate::searcher::{Candidate, Published, TrustFlags};

    /// Create an unflagged candidate in a PirateBay TV category.
    pub fn candidate(title: &str, locator: &str, published: Published) -> Candidate {
        Candidate {
            title: title.to_string(),
            locator: locator.to_string(),
            published,
            trust: TrustFlags::default(),
            category: Some("208".to_string()),
            source: "mock".to_string(),
        }
    }

    /// Create a candidate from a trusted uploader.
    pub fn trusted_candidate(title: &str, locator: &str, published: Published) -> Candidate {
        Candidate {
            trust: TrustFlags {
                trusted: true,
                vip: false,
            },
            ..candidate(title, locator, published)
        }
    }

    /// Create a test library series.
    pub fn library_series(id: &str, name: &str) -> LibrarySeries {
        LibrarySeries {
            id: id.to_string(),
            name: name.to_string(),
            provider_ids: HashMap::new(),
        }
    }

    /// Create a test library episode.
    pub fn library_episode(
        series_name: &str,
        season: Option<u32>,
        episode: Option<u32>,
        premiere_date: Option<NaiveDate>,
        is_virtual: bool,
    ) -> LibraryEpisode {
        LibraryEpisode {
            series_name: series_name.to_string(),
            season,
            episode,
            premiere_date,
            is_virtual,
        }
    }

    /// Create a test TMDB episode reference.
    pub fn tmdb_episode(season_number: u32, episode_number: u32, air_date: &str) -> TmdbEpisode {
        TmdbEpisode {
            season_number,
            episode_number,
            name: Some(format!("Episode {}", episode_number)),
            air_date: Some(air_date.to_string()),
        }
    }

    /// Create a test TMDB TV series with an optional `(season, episode, air_date)`
    /// next episode.
    pub fn tmdb_series(id: u32, name: &str, next: Option<(u32, u32, &str)>) -> TmdbSeries {
        TmdbSeries {
            id,
            name: name.to_string(),
            next_episode_to_air: next.map(|(s, e, d)| tmdb_episode(s, e, d)),
        }
    }
}
