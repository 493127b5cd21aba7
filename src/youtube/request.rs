//! Request descriptors and canonical cache-key derivation.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// One logical YouTube Data API call, prior to execution.
///
/// `operation` is the REST collection name (`search`, `channels`, ...) and
/// doubles as the cache-key namespace. Parameters live in a `BTreeMap` so the
/// encoding is canonical: two descriptors assembled in different orders hash
/// identically. The API key is not a parameter here; the transport appends it
/// per attempt, and it never participates in cache identity.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
  pub operation: &'static str,
  pub params: BTreeMap<String, String>,
}

impl RequestDescriptor {
  pub fn new(operation: &'static str) -> Self {
    Self {
      operation,
      params: BTreeMap::new(),
    }
  }

  /// Add one query parameter.
  pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
    self.params.insert(name.to_string(), value.into());
    self
  }

  /// Add a query parameter only if a value is present.
  pub fn opt_param(self, name: &str, value: Option<impl Into<String>>) -> Self {
    match value {
      Some(v) => self.param(name, v),
      None => self,
    }
  }

  /// Deterministic cache key: SHA-256 over the operation and the sorted
  /// parameter pairs.
  pub fn cache_key(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.operation.as_bytes());
    for (name, value) in &self.params {
      hasher.update(b"\n");
      hasher.update(name.as_bytes());
      hasher.update(b"=");
      hasher.update(value.as_bytes());
    }
    hex::encode(hasher.finalize())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn key_ignores_parameter_assembly_order() {
    let a = RequestDescriptor::new("search")
      .param("q", "cats")
      .param("order", "date")
      .param("maxResults", "25");
    let b = RequestDescriptor::new("search")
      .param("maxResults", "25")
      .param("order", "date")
      .param("q", "cats");

    assert_eq!(a.cache_key(), b.cache_key());
  }

  #[test]
  fn key_separates_operations_and_parameters() {
    let search = RequestDescriptor::new("search").param("q", "cats");
    let videos = RequestDescriptor::new("videos").param("q", "cats");
    assert_ne!(search.cache_key(), videos.cache_key());

    let other = RequestDescriptor::new("search").param("q", "dogs");
    assert_ne!(search.cache_key(), other.cache_key());
  }

  #[test]
  fn opt_param_skips_absent_values() {
    let bare = RequestDescriptor::new("playlistItems").param("playlistId", "PL1");
    let with_none = RequestDescriptor::new("playlistItems")
      .param("playlistId", "PL1")
      .opt_param("pageToken", None::<String>);

    assert_eq!(bare.cache_key(), with_none.cache_key());
  }
}
