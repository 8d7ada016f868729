//! Acceptance checks applied to raw candidates.
//!
//! All checks are pure and never touch the network. A candidate is accepted
//! only when every check applicable to its source passes.

use chrono::{Datelike, NaiveDate};
use regex_lite::Regex;

use crate::episode::{strip_apostrophes, WantedEpisode};

use super::types::{Candidate, DateGranularity, Published, SourceCapabilities};

/// Why a candidate was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Title does not start with the show name.
    NameMismatch,
    /// Uploaded before the episode aired.
    TooOld,
    /// The source should report a usable date and did not.
    MissingDate,
    /// Neither trusted nor VIP on a source that reports trust.
    Untrusted,
    /// Not classified as video content.
    NotVideo,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::NameMismatch => "name_mismatch",
            Rejection::TooOld => "too_old",
            Rejection::MissingDate => "missing_date",
            Rejection::Untrusted => "untrusted",
            Rejection::NotVideo => "not_video",
        }
    }
}

/// Coarse content classification derived from a source category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    Video,
    NonVideo,
}

/// Classify a category code or description.
///
/// Numeric codes follow PirateBay (2xx is video) and Newznab (5xxx is TV).
/// Free text counts as video when it starts with "video" or mentions "tv",
/// unless it is a subtitle or sample listing.
pub fn classify_category(raw: &str) -> ContentCategory {
    let raw = raw.trim();
    if let Ok(code) = raw.parse::<u32>() {
        return if (200..=299).contains(&code) || (5000..=5999).contains(&code) {
            ContentCategory::Video
        } else {
            ContentCategory::NonVideo
        };
    }

    let lower = raw.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if words
        .iter()
        .any(|w| w.starts_with("sub") || w.starts_with("sample"))
    {
        return ContentCategory::NonVideo;
    }

    if lower.starts_with("video") || words.iter().any(|w| *w == "tv") {
        ContentCategory::Video
    } else {
        ContentCategory::NonVideo
    }
}

/// Build the case-insensitive prefix pattern used for name matching.
///
/// The show name is split into alphanumeric words; any run of punctuation or
/// whitespace between them matches any run of non-alphanumerics in the
/// title, so `Star Trek: Discovery` matches `Star.Trek.Discovery`. An `&`
/// is its own word and also matches `and`.
pub fn show_name_pattern(show: &str) -> String {
    let stripped = strip_apostrophes(show);
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for c in stripped.chars() {
        if c.is_alphanumeric() {
            current.push(c);
            continue;
        }
        if !current.is_empty() {
            words.push(regex_lite::escape(&current));
            current.clear();
        }
        if c == '&' {
            words.push("(?:and|&)".to_string());
        }
    }
    if !current.is_empty() {
        words.push(regex_lite::escape(&current));
    }

    let mut pattern = format!("(?i)^{}", words.join("[^0-9a-z]+"));
    if words
        .last()
        .and_then(|w| w.chars().last())
        .is_some_and(|c| c.is_ascii_alphanumeric())
    {
        pattern.push_str(r"\b");
    }
    pattern
}

/// Filter for one wanted episode.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    name_pattern: Regex,
    air_date: Option<NaiveDate>,
}

impl CandidateFilter {
    /// Prepare the checks for the given episode.
    pub fn new(episode: &WantedEpisode) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            name_pattern: Regex::new(&show_name_pattern(episode.show()))?,
            air_date: episode.air_date(),
        })
    }

    /// Run every applicable check, in order: name, recency, trust, category.
    pub fn accepts(
        &self,
        candidate: &Candidate,
        caps: &SourceCapabilities,
    ) -> Result<(), Rejection> {
        self.check_name(candidate)?;
        self.check_recency(candidate, caps.dates)?;
        if caps.trust_signals && !candidate.trust.is_trusted_or_vip() {
            return Err(Rejection::Untrusted);
        }
        if caps.categories {
            match candidate.category.as_deref().map(classify_category) {
                Some(ContentCategory::Video) => {}
                _ => return Err(Rejection::NotVideo),
            }
        }
        Ok(())
    }

    fn check_name(&self, candidate: &Candidate) -> Result<(), Rejection> {
        if self
            .name_pattern
            .is_match(&strip_apostrophes(&candidate.title))
        {
            Ok(())
        } else {
            Err(Rejection::NameMismatch)
        }
    }

    fn check_recency(
        &self,
        candidate: &Candidate,
        granularity: DateGranularity,
    ) -> Result<(), Rejection> {
        let Some(aired) = self.air_date else {
            return Ok(());
        };

        let uploaded = match (granularity, &candidate.published) {
            (DateGranularity::None, _) => return Ok(()),
            (DateGranularity::MonthDay, Published::MonthDay { month, day }) => {
                return if (*month, *day) >= (aired.month(), aired.day()) {
                    Ok(())
                } else {
                    Err(Rejection::TooOld)
                };
            }
            (DateGranularity::MonthDay | DateGranularity::Date, Published::Date(d)) => *d,
            (_, Published::DateTime(dt)) => dt.date_naive(),
            _ => return Err(Rejection::MissingDate),
        };

        if uploaded >= aired {
            Ok(())
        } else {
            Err(Rejection::TooOld)
        }
    }
}
