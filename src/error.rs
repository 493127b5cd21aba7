//! Error types shared across the service layer.

use thiserror::Error;

/// Failures surfaced by the YouTube service layer.
///
/// Cache problems never appear here: the cache degrades to a miss on read
/// errors and drops the write on write errors.
#[derive(Debug, Error)]
pub enum ServiceError {
  /// The key pool is empty, or every key is already exhausted.
  #[error("no usable API key: the key list is empty or every key is exhausted")]
  NoKeyAvailable,

  /// Every key in the pool hit its quota within a single logical call.
  #[error("all API keys exhausted after {attempts} attempt(s)")]
  AllKeysExhausted { attempts: usize },

  /// The API rejected the request for a non-quota reason.
  #[error("YouTube API error (HTTP {status}): {message}")]
  Upstream { status: u16, message: String },

  /// The request never produced an HTTP response.
  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),
}
