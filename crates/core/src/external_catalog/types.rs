//! Types for external catalog API responses.

use serde::{Deserialize, Serialize};

/// A TMDB TV series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbSeries {
    /// TMDB series ID.
    pub id: u32,
    /// Series name.
    pub name: String,
    /// The next scheduled episode (only present in details responses).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_episode_to_air: Option<TmdbEpisode>,
}

/// A TMDB episode reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbEpisode {
    /// Season number (0 for specials).
    pub season_number: u32,
    /// Episode number.
    pub episode_number: u32,
    /// Episode name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Air date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
}
