//! ytscout - YouTube content research toolkit.
//!
//! The crate wraps the YouTube Data API v3 behind a small service layer: a
//! shared pool of API keys rotated as quotas run out, and a durable SQLite
//! response cache so repeated research sessions don't burn quota. UIs and
//! exporters sit on top of [`youtube::YouTubeService`]; everything here is
//! presentation-agnostic.

pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod logging;
pub mod util;
pub mod youtube;

pub use cache::{CacheStore, NoopStore, SqliteStore};
pub use error::ServiceError;
pub use keys::KeyPool;
pub use youtube::{SearchFilters, YouTubeService};
