//! Station directory: metadata client, disk cache and code → name lookup.
//!
//! The directory is loaded once at startup (disk cache first, then the
//! API) and injected into the query engine.

mod cache;
mod client;
mod directory;
mod error;

pub use cache::{StationCache, StationCacheConfig};
pub use client::{StationClient, StationClientConfig, StationDto};
pub use directory::{DirectoryLoader, DirectorySource, StationDirectory};
pub use error::StationError;
