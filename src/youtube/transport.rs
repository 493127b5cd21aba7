//! Single-attempt transport to the YouTube Data API.
//!
//! The transport executes exactly one call with one concrete key and
//! classifies the outcome. Quota classification happens here, once, from the
//! decoded error body; nothing downstream re-derives it from strings.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::request::RequestDescriptor;

/// Base URL of the YouTube Data API v3.
const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Error reasons Google attaches to quota and rate-limit failures.
const QUOTA_REASONS: &[&str] = &[
  "quotaExceeded",
  "dailyLimitExceeded",
  "rateLimitExceeded",
  "userRateLimitExceeded",
];

/// Outcome classification for one call attempt.
#[derive(Debug)]
pub enum CallError {
  /// The key's quota is spent, or the caller is being rate limited.
  Quota { status: u16, reason: String },
  /// Any other rejection from the API.
  Upstream { status: u16, message: String },
  /// The request never produced an HTTP response.
  Network(reqwest::Error),
}

/// One attempt of one API call with one concrete key.
#[async_trait]
pub trait ApiTransport: Send + Sync {
  async fn execute(&self, request: &RequestDescriptor, api_key: &str) -> Result<Value, CallError>;
}

/// HTTPS transport against the real API.
pub struct HttpTransport {
  http: reqwest::Client,
  base_url: String,
}

impl HttpTransport {
  pub fn new() -> Self {
    Self::with_base_url(API_BASE)
  }

  /// Point the transport at a different base URL (local test servers).
  pub fn with_base_url(base_url: impl Into<String>) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url: base_url.into(),
    }
  }
}

impl Default for HttpTransport {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl ApiTransport for HttpTransport {
  async fn execute(&self, request: &RequestDescriptor, api_key: &str) -> Result<Value, CallError> {
    let url = format!("{}/{}", self.base_url, request.operation);

    let response = self
      .http
      .get(&url)
      .query(&request.params)
      .query(&[("key", api_key)])
      .send()
      .await
      .map_err(CallError::Network)?;

    let status = response.status();
    if status.is_success() {
      debug!(operation = request.operation, "API call succeeded");
      return response.json().await.map_err(CallError::Network);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_failure(status.as_u16(), &body))
  }
}

/// Classify an HTTP failure from its status and error body.
///
/// 429 is always rate limiting; 403 counts as quota only when the body
/// carries a quota-class reason. Other 403s are access problems and never
/// trigger rotation.
fn classify_failure(status: u16, body: &str) -> CallError {
  let parsed: Option<Value> = serde_json::from_str(body).ok();

  let reason = parsed
    .as_ref()
    .and_then(|v| v["error"]["errors"][0]["reason"].as_str())
    .unwrap_or_default()
    .to_string();
  let message = parsed
    .as_ref()
    .and_then(|v| v["error"]["message"].as_str())
    .map(String::from)
    .unwrap_or_else(|| body.chars().take(200).collect());

  if status == 429 {
    return CallError::Quota { status, reason };
  }
  if status == 403 && QUOTA_REASONS.contains(&reason.as_str()) {
    return CallError::Quota { status, reason };
  }

  CallError::Upstream { status, message }
}
