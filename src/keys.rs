//! Shared API key pool with rotation and exhaustion tracking.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

/// A pool of interchangeable YouTube API keys.
///
/// One pool instance is shared by every concurrent operation in the process
/// (via `Arc`), so exhaustion discovered by one caller immediately steers all
/// others away from the dead key. All access goes through a single mutex; the
/// pool never blocks beyond lock acquisition.
pub struct KeyPool {
  state: Mutex<PoolState>,
}

#[derive(Default)]
struct PoolState {
  keys: Vec<String>,
  current: usize,
  exhausted: HashSet<usize>,
}

impl KeyPool {
  /// Create an empty pool.
  pub fn new() -> Self {
    Self {
      state: Mutex::new(PoolState::default()),
    }
  }

  /// Create a pool from a newline-separated key block.
  pub fn from_raw(raw: &str) -> Self {
    let pool = Self::new();
    pool.set_keys(raw);
    pool
  }

  /// Replace the key list from a newline-separated block.
  ///
  /// Lines are trimmed and blank lines discarded; order is preserved.
  /// Resets the rotation index and the exhausted set.
  pub fn set_keys(&self, raw: &str) {
    let keys: Vec<String> = raw
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(String::from)
      .collect();

    let mut state = self.lock();
    state.keys = keys;
    state.current = 0;
    state.exhausted.clear();
  }

  /// The key at the current index, skipping exhausted entries.
  ///
  /// Advances past exhausted indices (wrapping) until a usable key is found;
  /// returns `None` once a full cycle finds nothing. The index comes back
  /// alongside the key so the caller can attribute a quota failure to the
  /// exact key it used, even if the pool rotated concurrently.
  pub fn current_key(&self) -> Option<(usize, String)> {
    let mut state = self.lock();
    if state.keys.is_empty() {
      return None;
    }

    let start = state.current;
    while state.exhausted.contains(&state.current) {
      state.current = (state.current + 1) % state.keys.len();
      if state.current == start {
        // Full cycle: every key is exhausted.
        return None;
      }
    }

    Some((state.current, state.keys[state.current].clone()))
  }

  /// Advance the current index by one, wrapping around.
  ///
  /// Returns `false` on an empty pool. The new current key is not guaranteed
  /// usable; callers re-check via [`KeyPool::current_key`].
  pub fn rotate(&self) -> bool {
    let mut state = self.lock();
    if state.keys.is_empty() {
      return false;
    }
    state.current = (state.current + 1) % state.keys.len();
    true
  }

  /// Mark the key at `index` exhausted and advance the current index.
  ///
  /// Marking the same index twice only costs the extra advance. Indices from
  /// before a [`KeyPool::set_keys`] swap may be out of range; those are
  /// ignored.
  pub fn mark_exhausted(&self, index: usize) {
    let mut state = self.lock();
    if index >= state.keys.len() {
      return;
    }
    if state.exhausted.insert(index) {
      warn!(index, key = %redact(&state.keys[index]), "API key marked exhausted");
    }
    state.current = (state.current + 1) % state.keys.len();
  }

  /// Number of keys in the pool, exhausted ones included.
  pub fn len(&self) -> usize {
    self.lock().keys.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().keys.is_empty()
  }

  fn lock(&self) -> MutexGuard<'_, PoolState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Default for KeyPool {
  fn default() -> Self {
    Self::new()
  }
}

/// First few characters of a key, for log lines.
fn redact(key: &str) -> String {
  let head: String = key.chars().take(5).collect();
  format!("{head}...")
}
