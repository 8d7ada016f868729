//! Quality ladder: search-term suffixes tried from most to least preferred.

use serde::{Deserialize, Serialize};

/// Ordered list of quality tiers.
///
/// The first tier is the most specific. The resolver walks the ladder
/// downwards and stops at the first tier that yields an acceptable release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityLadder {
    tiers: Vec<String>,
}

impl QualityLadder {
    /// Create a ladder from tiers in priority order.
    pub fn new<I, S>(tiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tiers: tiers.into_iter().map(Into::into).collect(),
        }
    }

    /// Tiers in priority order.
    pub fn tiers(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl Default for QualityLadder {
    fn default() -> Self {
        Self::new(["HDR 2160p", "2160p", "1080p"])
    }
}
