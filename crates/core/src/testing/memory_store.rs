//! In-memory show store for testing.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use crate::episode::WantedEpisode;
use crate::store::{HandledLedger, ShowCacheRecord, ShowStore, StoreError};

/// [`ShowStore`] kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryShowStore {
    shows: RwLock<BTreeSet<String>>,
    records: RwLock<HashMap<String, ShowCacheRecord>>,
    ledgers: RwLock<HashMap<String, HandledLedger>>,
}

impl MemoryShowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose library contains the given show folders.
    pub fn with_shows<I, S>(shows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            shows: RwLock::new(shows.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }
}

impl ShowStore for MemoryShowStore {
    fn list_shows(&self) -> Result<Vec<String>, StoreError> {
        let shows = self.shows.read().unwrap_or_else(|e| e.into_inner());
        Ok(shows.iter().cloned().collect())
    }

    fn load_record(&self, show: &str) -> Result<Option<ShowCacheRecord>, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(show).cloned())
    }

    fn save_record(&self, record: &ShowCacheRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.show.clone(), record.clone());
        Ok(())
    }

    fn delete_record(&self, show: &str) -> Result<(), StoreError> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(show);
        Ok(())
    }

    fn is_handled(&self, episode: &WantedEpisode) -> Result<bool, StoreError> {
        let ledgers = self.ledgers.read().unwrap_or_else(|e| e.into_inner());
        Ok(ledgers
            .get(episode.show())
            .is_some_and(|l| l.contains(episode.key())))
    }

    fn mark_handled(&self, episode: &WantedEpisode) -> Result<(), StoreError> {
        self.ledgers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(episode.show().to_string())
            .or_default()
            .insert(episode.key());
        Ok(())
    }
}
