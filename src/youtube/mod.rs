//! YouTube Data API service layer.
//!
//! A shared pool of API keys is rotated as quotas run out, and every
//! cache-eligible operation checks the durable response cache before
//! spending quota. The surface consumed by the rest of the application is
//! [`YouTubeService`]; everything below it is plumbing.

pub mod client;
pub mod request;
pub mod service;
pub mod transport;
pub mod types;

pub use client::YouTubeClient;
pub use request::RequestDescriptor;
pub use service::YouTubeService;
pub use transport::{ApiTransport, CallError, HttpTransport};
pub use types::{SearchFilters, SearchOrder, VideoDefinition, VideoDuration};
