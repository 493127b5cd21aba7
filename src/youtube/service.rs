//! Cached facade over the quota-aware client.

use std::sync::Arc;

use chrono::Duration;
use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheStore, SqliteStore};
use crate::error::ServiceError;
use crate::keys::KeyPool;

use super::client::YouTubeClient;
use super::request::RequestDescriptor;
use super::types::SearchFilters;

// How long each resource class stays cached. Search results move fast,
// channel and video metadata barely move, playlist pages sit in between.
const SEARCH_TTL_HOURS: i64 = 24;
const DETAILS_TTL_HOURS: i64 = 48;
const PLAYLIST_TTL_HOURS: i64 = 6;

/// The public YouTube operation set.
///
/// Every cache-eligible call derives a canonical cache key, checks the
/// response cache, and only goes to the network on a miss; successful
/// responses are stored with the operation's TTL. Quota and upstream
/// failures propagate as [`ServiceError`]; cache trouble never does.
///
/// Clones share the same pool, transport, and cache.
pub struct YouTubeService<S: CacheStore = SqliteStore> {
  client: YouTubeClient,
  cache: Arc<S>,
}

impl YouTubeService<SqliteStore> {
  /// Service with the default on-disk cache and real HTTP transport.
  pub fn new(pool: Arc<KeyPool>) -> color_eyre::Result<Self> {
    Ok(Self::with_parts(YouTubeClient::new(pool), SqliteStore::open()?))
  }
}

impl<S: CacheStore> YouTubeService<S> {
  /// Service from explicit parts.
  pub fn with_parts(client: YouTubeClient, cache: S) -> Self {
    Self {
      client,
      cache: Arc::new(cache),
    }
  }

  /// Shared key pool handle; the application updates keys through this when
  /// the user edits the key list.
  pub fn pool(&self) -> &Arc<KeyPool> {
    self.client.pool()
  }

  /// Search for videos matching `query`. Results are cached for a day.
  pub async fn search_videos(
    &self,
    query: &str,
    filters: &SearchFilters,
  ) -> Result<Value, ServiceError> {
    let request = filters.apply(
      RequestDescriptor::new("search")
        .param("part", "snippet")
        .param("type", "video")
        .param("q", query),
    );
    self
      .fetch_cached(request, Duration::hours(SEARCH_TTL_HOURS))
      .await
  }

  /// Details for one or more channels; ids are batched into a single call.
  pub async fn get_channel_details(&self, channel_ids: &[&str]) -> Result<Value, ServiceError> {
    let request = RequestDescriptor::new("channels")
      .param("part", "snippet,statistics,contentDetails")
      .param("id", channel_ids.join(","));
    self
      .fetch_cached(request, Duration::hours(DETAILS_TTL_HOURS))
      .await
  }

  /// Details for one or more videos; ids are batched into a single call.
  pub async fn get_video_details(&self, video_ids: &[&str]) -> Result<Value, ServiceError> {
    let request = RequestDescriptor::new("videos")
      .param("part", "snippet,statistics,contentDetails")
      .param("id", video_ids.join(","));
    self
      .fetch_cached(request, Duration::hours(DETAILS_TTL_HOURS))
      .await
  }

  /// One page of a playlist. Each (playlist, page token, page size) triple
  /// caches separately, so only exact repeat fetches hit.
  pub async fn get_playlist_items(
    &self,
    playlist_id: &str,
    page_token: Option<&str>,
    max_results: u32,
  ) -> Result<Value, ServiceError> {
    let request = RequestDescriptor::new("playlistItems")
      .param("part", "snippet,contentDetails")
      .param("playlistId", playlist_id)
      .param("maxResults", max_results.to_string())
      .opt_param("pageToken", page_token);
    self
      .fetch_cached(request, Duration::hours(PLAYLIST_TTL_HOURS))
      .await
  }

  /// One page of a video's comment threads. Comments churn constantly, so
  /// these go straight to the API.
  pub async fn get_comment_threads(
    &self,
    video_id: &str,
    page_token: Option<&str>,
    max_results: u32,
  ) -> Result<Value, ServiceError> {
    let request = RequestDescriptor::new("commentThreads")
      .param("part", "snippet,replies")
      .param("videoId", video_id)
      .param("maxResults", max_results.to_string())
      .opt_param("pageToken", page_token);
    self.client.execute(&request).await
  }

  /// Drop one cached response by its derived key.
  pub fn invalidate(&self, cache_key: &str) {
    self.cache.invalidate(cache_key);
  }

  /// Drop every cached response.
  pub fn clear_cache(&self) {
    self.cache.clear_all();
  }

  async fn fetch_cached(
    &self,
    request: RequestDescriptor,
    ttl: Duration,
  ) -> Result<Value, ServiceError> {
    let key = request.cache_key();

    if let Some(hit) = self.cache.get(&key) {
      debug!(operation = request.operation, "cache hit");
      return Ok(hit);
    }

    let response = self.client.execute(&request).await?;
    self.cache.set(&key, &response, ttl);
    Ok(response)
  }
}

impl<S: CacheStore> Clone for YouTubeService<S> {
  fn clone(&self) -> Self {
    Self {
      client: self.client.clone(),
      cache: Arc::clone(&self.cache),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::youtube::transport::{ApiTransport, CallError};
  use async_trait::async_trait;
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  /// Transport that always succeeds, counting calls and keeping the last
  /// request it saw.
  struct CountingTransport {
    calls: AtomicUsize,
    response: Value,
    last_request: Mutex<Option<RequestDescriptor>>,
  }

  impl CountingTransport {
    fn new(response: Value) -> Self {
      Self {
        calls: AtomicUsize::new(0),
        response,
        last_request: Mutex::new(None),
      }
    }

    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl ApiTransport for CountingTransport {
    async fn execute(
      &self,
      request: &RequestDescriptor,
      _api_key: &str,
    ) -> Result<Value, CallError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      *self.last_request.lock().unwrap() = Some(request.clone());
      Ok(self.response.clone())
    }
  }

  fn service(transport: Arc<CountingTransport>) -> YouTubeService<SqliteStore> {
    let pool = Arc::new(KeyPool::from_raw("TEST_KEY"));
    let client = YouTubeClient::with_transport(pool, transport);
    YouTubeService::with_parts(client, SqliteStore::in_memory().unwrap())
  }

  #[tokio::test]
  async fn repeat_searches_are_served_from_cache() {
    let transport = Arc::new(CountingTransport::new(json!({"items": [{"id": "x"}]})));
    let service = service(Arc::clone(&transport));
    let filters = SearchFilters::default();

    let first = service.search_videos("rust tutorials", &filters).await.unwrap();
    let second = service.search_videos("rust tutorials", &filters).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(transport.calls(), 1);
  }

  #[tokio::test]
  async fn distinct_playlist_pages_cache_separately() {
    let transport = Arc::new(CountingTransport::new(json!({"items": []})));
    let service = service(Arc::clone(&transport));

    service.get_playlist_items("PL1", None, 50).await.unwrap();
    service.get_playlist_items("PL1", Some("CAoQAA"), 50).await.unwrap();
    service.get_playlist_items("PL1", Some("CAoQAA"), 25).await.unwrap();
    // Exact repeat of the second page: served from cache.
    service.get_playlist_items("PL1", Some("CAoQAA"), 50).await.unwrap();

    assert_eq!(transport.calls(), 3);
  }

  #[tokio::test]
  async fn comment_threads_bypass_the_cache() {
    let transport = Arc::new(CountingTransport::new(json!({"items": []})));
    let service = service(Arc::clone(&transport));

    service.get_comment_threads("vid", None, 100).await.unwrap();
    service.get_comment_threads("vid", None, 100).await.unwrap();

    assert_eq!(transport.calls(), 2);
  }

  #[tokio::test]
  async fn channel_ids_are_batched_into_one_call() {
    let transport = Arc::new(CountingTransport::new(json!({"items": []})));
    let service = service(Arc::clone(&transport));

    service.get_channel_details(&["UC1", "UC2"]).await.unwrap();

    assert_eq!(transport.calls(), 1);
    let request = transport.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.operation, "channels");
    assert_eq!(request.params.get("id").map(String::as_str), Some("UC1,UC2"));
  }

  #[tokio::test]
  async fn clear_cache_forces_a_refetch() {
    let transport = Arc::new(CountingTransport::new(json!({"items": []})));
    let service = service(Arc::clone(&transport));

    service.get_video_details(&["abc"]).await.unwrap();
    service.clear_cache();
    service.get_video_details(&["abc"]).await.unwrap();

    assert_eq!(transport.calls(), 2);
  }
}
