//! Cache storage trait and SQLite implementation.

use chrono::{Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

/// Storage backend for cached API responses.
///
/// `get` and `set` are best-effort: a backend that fails to read reports a
/// miss, and a failed write is dropped. Callers never see storage errors.
pub trait CacheStore: Send + Sync {
  /// Stored payload for `key`, if present and not yet expired.
  fn get(&self, key: &str) -> Option<Value>;

  /// Upsert `value` under `key`, expiring `ttl` from now.
  fn set(&self, key: &str, value: &Value, ttl: Duration);

  /// Drop one entry. Absence is not an error.
  fn invalidate(&self, key: &str);

  /// Drop every entry, leaving the store empty and immediately usable.
  fn clear_all(&self);
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStore;

impl CacheStore for NoopStore {
  fn get(&self, _key: &str) -> Option<Value> {
    None // Always miss
  }

  fn set(&self, _key: &str, _value: &Value, _ttl: Duration) {
    // Discard
  }

  fn invalidate(&self, _key: &str) {}

  fn clear_all(&self) {}
}

/// Schema for the response cache. `timestamp` and `expiry` are epoch seconds
/// in the same clock domain.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS api_cache (
    key TEXT PRIMARY KEY,
    response_json TEXT,
    timestamp REAL,
    expiry REAL
);
"#;

/// SQLite-backed response cache.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open the cache at the default location.
  pub fn open() -> Result<Self> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open (or create) the cache database at `path`.
  pub fn open_at(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// In-memory cache, for tests and throwaway sessions.
  pub fn in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory cache: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("ytscout").join("cache.db"))
  }

  fn lock(&self) -> MutexGuard<'_, Connection> {
    self.conn.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Read `key`, judging freshness against `now` (epoch seconds).
  fn get_at(&self, key: &str, now: f64) -> rusqlite::Result<Option<Value>> {
    let conn = self.lock();

    let row: Option<(String, f64)> = conn
      .query_row(
        "SELECT response_json, expiry FROM api_cache WHERE key = ?",
        params![key],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()?;

    let Some((payload, expiry)) = row else {
      return Ok(None);
    };

    if now >= expiry {
      // Expired: clean up so the entry can't resurrect on a later read.
      conn.execute("DELETE FROM api_cache WHERE key = ?", params![key])?;
      return Ok(None);
    }

    match serde_json::from_str(&payload) {
      Ok(value) => Ok(Some(value)),
      Err(e) => {
        // An undecodable payload is as good as absent; drop it.
        warn!(key, error = %e, "dropping corrupt cache entry");
        conn.execute("DELETE FROM api_cache WHERE key = ?", params![key])?;
        Ok(None)
      }
    }
  }

  fn set_at(&self, key: &str, value: &Value, ttl: Duration, now: f64) -> rusqlite::Result<()> {
    let payload = value.to_string();
    let expiry = now + ttl_seconds(ttl);

    let conn = self.lock();
    conn.execute(
      "INSERT OR REPLACE INTO api_cache (key, response_json, timestamp, expiry)
       VALUES (?, ?, ?, ?)",
      params![key, payload, now, expiry],
    )?;

    Ok(())
  }
}

impl CacheStore for SqliteStore {
  fn get(&self, key: &str) -> Option<Value> {
    match self.get_at(key, unix_now()) {
      Ok(hit) => hit,
      Err(e) => {
        warn!(key, error = %e, "cache read failed; treating as miss");
        None
      }
    }
  }

  fn set(&self, key: &str, value: &Value, ttl: Duration) {
    if let Err(e) = self.set_at(key, value, ttl, unix_now()) {
      warn!(key, error = %e, "cache write failed; response not persisted");
    }
  }

  fn invalidate(&self, key: &str) {
    let conn = self.lock();
    if let Err(e) = conn.execute("DELETE FROM api_cache WHERE key = ?", params![key]) {
      warn!(key, error = %e, "failed to invalidate cache entry");
    }
  }

  fn clear_all(&self) {
    let conn = self.lock();
    match conn.execute("DELETE FROM api_cache", []) {
      Ok(dropped) => debug!(dropped, "cache cleared"),
      Err(e) => warn!(error = %e, "failed to clear cache"),
    }
  }
}

/// Current time as epoch seconds, matching the `timestamp`/`expiry` columns.
fn unix_now() -> f64 {
  Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Signed TTL in seconds; zero or negative TTLs produce entries that are
/// already expired.
fn ttl_seconds(ttl: Duration) -> f64 {
  ttl.num_milliseconds() as f64 / 1000.0
}
