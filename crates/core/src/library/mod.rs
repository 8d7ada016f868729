//! Media library service abstraction.
//!
//! The library knows which series are tracked and which of their episodes
//! are placeholders (scheduled or aired, but with no file on disk).

mod jellyfin;
mod types;

pub use jellyfin::JellyfinClient;
pub use types::*;
