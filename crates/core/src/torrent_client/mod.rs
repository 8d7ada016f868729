//! Torrent client abstraction.
//!
//! This module provides a `TorrentClient` trait for handing releases to a
//! download backend (Transmission or qBittorrent).

mod qbittorrent;
mod transmission;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use transmission::TransmissionClient;
pub use types::*;
