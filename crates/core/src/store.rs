//! Per-show state kept next to the media.
//!
//! Each show folder under the library root may hold two small JSON files:
//! - `cached.json`: the next episode to air ([`ShowCacheRecord`]).
//! - `resolved.json`: recently submitted episodes ([`HandledLedger`]).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::episode::{EpisodeKey, WantedEpisode};

const CACHE_FILE: &str = "cached.json";
const LEDGER_FILE: &str = "resolved.json";

/// Maximum number of episodes remembered per show.
pub const LEDGER_CAPACITY: usize = 32;

/// Errors from reading or writing per-show state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Show name {0:?} cannot be used as a folder name")]
    InvalidShowName(String),
}

/// Folder name for a show under the library root.
///
/// Path separators and control characters become `-` and leading dots are
/// dropped, so the result is always a single visible child of the root.
/// `None` when nothing usable is left.
pub fn show_dir_name(show: &str) -> Option<String> {
    let replaced: String = show
        .chars()
        .map(|c| {
            if matches!(c, '/' | '\\') || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect();
    let name = replaced.trim_start_matches('.');
    (!name.trim().is_empty()).then(|| name.to_string())
}

/// The next episode to air for one show, as last reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowCacheRecord {
    pub show: String,
    pub season_number: u32,
    pub episode_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
}

impl ShowCacheRecord {
    /// Air date as a calendar date. Unparseable dates count as unknown.
    pub fn air_date(&self) -> Option<NaiveDate> {
        self.air_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
    }

    pub fn to_wanted(&self) -> WantedEpisode {
        WantedEpisode::new(
            self.show.clone(),
            self.season_number,
            self.episode_number,
            self.air_date(),
        )
    }
}

/// Episodes already handed to the torrent client for one show, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandledLedger {
    #[serde(default)]
    pub episodes: Vec<EpisodeKey>,
}

impl HandledLedger {
    pub fn contains(&self, key: EpisodeKey) -> bool {
        self.episodes.contains(&key)
    }

    /// Record an episode, dropping the oldest entries past capacity.
    pub fn insert(&mut self, key: EpisodeKey) {
        if self.contains(key) {
            return;
        }
        self.episodes.push(key);
        if self.episodes.len() > LEDGER_CAPACITY {
            let excess = self.episodes.len() - LEDGER_CAPACITY;
            self.episodes.drain(..excess);
        }
    }
}

/// Storage for per-show cache records and handled-episode ledgers.
pub trait ShowStore: Send + Sync {
    /// Names of the shows present in the library, sorted.
    fn list_shows(&self) -> Result<Vec<String>, StoreError>;

    /// Load the cache record for a show. `Ok(None)` when there is none.
    fn load_record(&self, show: &str) -> Result<Option<ShowCacheRecord>, StoreError>;

    /// Overwrite the cache record for `record.show`.
    fn save_record(&self, record: &ShowCacheRecord) -> Result<(), StoreError>;

    /// Remove the cache record for a show. Missing records are not an error.
    fn delete_record(&self, show: &str) -> Result<(), StoreError>;

    /// Whether the episode was already submitted in an earlier run.
    fn is_handled(&self, episode: &WantedEpisode) -> Result<bool, StoreError>;

    /// Remember that the episode was submitted.
    fn mark_handled(&self, episode: &WantedEpisode) -> Result<(), StoreError>;
}

/// [`ShowStore`] backed by JSON files in each show folder.
#[derive(Debug, Clone)]
pub struct FsShowStore {
    root: PathBuf,
}

impl FsShowStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn show_file(&self, show: &str, file: &str) -> Result<PathBuf, StoreError> {
        let dir =
            show_dir_name(show).ok_or_else(|| StoreError::InvalidShowName(show.to_string()))?;
        Ok(self.root.join(dir).join(file))
    }

    fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, StoreError> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                source,
            })
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "Wrote show state");
        Ok(())
    }

    fn load_ledger(&self, show: &str) -> Result<HandledLedger, StoreError> {
        Ok(Self::read_json(&self.show_file(show, LEDGER_FILE)?)?.unwrap_or_default())
    }
}

impl ShowStore for FsShowStore {
    fn list_shows(&self) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut shows = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })?;
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with('.') {
                shows.push(name);
            }
        }

        shows.sort();
        Ok(shows)
    }

    fn load_record(&self, show: &str) -> Result<Option<ShowCacheRecord>, StoreError> {
        Self::read_json(&self.show_file(show, CACHE_FILE)?)
    }

    fn save_record(&self, record: &ShowCacheRecord) -> Result<(), StoreError> {
        Self::write_json(&self.show_file(&record.show, CACHE_FILE)?, record)
    }

    fn delete_record(&self, show: &str) -> Result<(), StoreError> {
        let path = self.show_file(show, CACHE_FILE)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn is_handled(&self, episode: &WantedEpisode) -> Result<bool, StoreError> {
        Ok(self.load_ledger(episode.show())?.contains(episode.key()))
    }

    fn mark_handled(&self, episode: &WantedEpisode) -> Result<(), StoreError> {
        // A corrupt ledger is replaced rather than blocking new entries.
        let mut ledger = self.load_ledger(episode.show()).unwrap_or_default();
        ledger.insert(episode.key());
        Self::write_json(&self.show_file(episode.show(), LEDGER_FILE)?, &ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(show: &str, season: u32, episode: u32, air_date: Option<&str>) -> ShowCacheRecord {
        ShowCacheRecord {
            show: show.to_string(),
            season_number: season,
            episode_number: episode,
            air_date: air_date.map(str::to_string),
        }
    }

    #[test]
    fn test_record_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FsShowStore::new(dir.path());

        assert!(store.load_record("Alpha").unwrap().is_none());

        let rec = record("Alpha", 2, 5, Some("2024-06-10"));
        store.save_record(&rec).unwrap();
        assert!(dir.path().join("Alpha").join("cached.json").exists());
        assert_eq!(store.load_record("Alpha").unwrap(), Some(rec));
    }

    #[test]
    fn test_record_file_format() {
        let dir = TempDir::new().unwrap();
        let store = FsShowStore::new(dir.path());
        store.save_record(&record("Alpha", 2, 5, None)).unwrap();

        let raw = fs::read_to_string(dir.path().join("Alpha/cached.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["show"], "Alpha");
        assert_eq!(value["season_number"], 2);
        assert_eq!(value["episode_number"], 5);
        assert!(value.get("air_date").is_none());
    }

    #[test]
    fn test_record_to_wanted() {
        let wanted = record("Alpha", 2, 5, Some("2024-06-10")).to_wanted();
        assert_eq!(wanted.show(), "Alpha");
        assert_eq!(wanted.key(), EpisodeKey::new(2, 5));
        assert_eq!(wanted.air_date(), NaiveDate::from_ymd_opt(2024, 6, 10));

        assert!(record("Alpha", 2, 5, Some("soon")).to_wanted().air_date().is_none());
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Alpha")).unwrap();
        fs::write(dir.path().join("Alpha/cached.json"), "{not json").unwrap();

        let store = FsShowStore::new(dir.path());
        assert!(matches!(
            store.load_record("Alpha"),
            Err(StoreError::Json { .. })
        ));
    }

    #[test]
    fn test_delete_record() {
        let dir = TempDir::new().unwrap();
        let store = FsShowStore::new(dir.path());

        store.delete_record("Alpha").unwrap();

        store.save_record(&record("Alpha", 1, 1, None)).unwrap();
        store.delete_record("Alpha").unwrap();
        assert!(store.load_record("Alpha").unwrap().is_none());
    }

    #[test]
    fn test_list_shows_skips_files_and_hidden_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Beta")).unwrap();
        fs::create_dir(dir.path().join("Alpha")).unwrap();
        fs::create_dir(dir.path().join(".trash")).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let store = FsShowStore::new(dir.path());
        assert_eq!(store.list_shows().unwrap(), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_list_shows_missing_root() {
        let dir = TempDir::new().unwrap();
        let store = FsShowStore::new(dir.path().join("missing"));
        assert!(matches!(store.list_shows(), Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_mark_handled() {
        let dir = TempDir::new().unwrap();
        let store = FsShowStore::new(dir.path());
        let ep = WantedEpisode::new("Alpha", 2, 5, None);
        let other = WantedEpisode::new("Alpha", 2, 6, None);

        assert!(!store.is_handled(&ep).unwrap());
        store.mark_handled(&ep).unwrap();
        store.mark_handled(&ep).unwrap();

        assert!(store.is_handled(&ep).unwrap());
        assert!(!store.is_handled(&other).unwrap());
        assert_eq!(store.load_ledger("Alpha").unwrap().episodes.len(), 1);
    }

    #[test]
    fn test_mark_handled_replaces_corrupt_ledger() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Alpha")).unwrap();
        fs::write(dir.path().join("Alpha/resolved.json"), "garbage").unwrap();

        let store = FsShowStore::new(dir.path());
        let ep = WantedEpisode::new("Alpha", 1, 1, None);
        assert!(store.is_handled(&ep).is_err());

        store.mark_handled(&ep).unwrap();
        assert!(store.is_handled(&ep).unwrap());
    }

    #[test]
    fn test_show_dir_name() {
        assert_eq!(show_dir_name("Alpha").as_deref(), Some("Alpha"));
        assert_eq!(show_dir_name("Face/Off").as_deref(), Some("Face-Off"));
        assert_eq!(show_dir_name("../../etc").as_deref(), Some("-..-etc"));
        assert_eq!(show_dir_name(r"C:\Shows").as_deref(), Some("C:-Shows"));
        assert!(show_dir_name("..").is_none());
        assert!(show_dir_name("").is_none());
    }

    #[test]
    fn test_show_names_stay_under_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("library");
        let store = FsShowStore::new(&root);

        store.save_record(&record("../escape", 1, 1, None)).unwrap();
        assert!(root.join("-escape").join("cached.json").exists());
        assert!(!dir.path().join("escape").exists());

        assert!(matches!(
            store.mark_handled(&WantedEpisode::new("..", 1, 1, None)),
            Err(StoreError::InvalidShowName(_))
        ));
        assert!(!dir.path().join("resolved.json").exists());
    }

    #[test]
    fn test_ledger_capacity_drops_oldest() {
        let mut ledger = HandledLedger::default();
        for e in 1..=(LEDGER_CAPACITY as u32 + 3) {
            ledger.insert(EpisodeKey::new(1, e));
        }

        assert_eq!(ledger.episodes.len(), LEDGER_CAPACITY);
        assert!(!ledger.contains(EpisodeKey::new(1, 3)));
        assert!(ledger.contains(EpisodeKey::new(1, 4)));
        assert!(ledger.contains(EpisodeKey::new(1, LEDGER_CAPACITY as u32 + 3)));
    }
}
