//! Episode identity types shared by detection, resolution and dispatch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Season/episode pair, ordered by season then episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EpisodeKey {
    pub season_number: u32,
    pub episode_number: u32,
}

impl EpisodeKey {
    pub fn new(season_number: u32, episode_number: u32) -> Self {
        Self {
            season_number,
            episode_number,
        }
    }
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season_number, self.episode_number)
    }
}

/// One episode the pipeline should try to acquire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WantedEpisode {
    show: String,
    key: EpisodeKey,
    air_date: Option<NaiveDate>,
}

impl WantedEpisode {
    /// Create a wanted episode.
    pub fn new(
        show: impl Into<String>,
        season: u32,
        episode: u32,
        air_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            show: show.into(),
            key: EpisodeKey::new(season, episode),
            air_date,
        }
    }

    pub fn show(&self) -> &str {
        &self.show
    }

    pub fn season(&self) -> u32 {
        self.key.season_number
    }

    pub fn episode(&self) -> u32 {
        self.key.episode_number
    }

    pub fn key(&self) -> EpisodeKey {
        self.key
    }

    /// Premiere date, when known.
    pub fn air_date(&self) -> Option<NaiveDate> {
        self.air_date
    }

    /// Season 0 holds specials.
    pub fn is_special(&self) -> bool {
        self.key.season_number == 0
    }
}

impl fmt::Display for WantedEpisode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.show, self.key)
    }
}

/// Remove apostrophe variants so "Foo's Bar" and "Foos Bar" compare equal.
pub fn strip_apostrophes(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}' | '\u{2018}' | '\u{02BC}' | '`'))
        .collect()
}
