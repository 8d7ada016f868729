//! Torrent search abstraction.
//!
//! This module provides a `Searcher` trait for querying torrent indexers,
//! two backends (PirateBay JSON API and Torznab feeds), and the pure
//! candidate filter applied to their results.

pub mod filter;
mod piratebay;
mod torznab;
mod types;

pub use filter::{CandidateFilter, ContentCategory, Rejection};
pub use piratebay::PirateBaySearcher;
pub use torznab::TorznabSearcher;
pub use types::*;
