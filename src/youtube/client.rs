//! Quota-aware API client: rotation and bounded retry over a shared key pool.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::error::ServiceError;
use crate::keys::KeyPool;

use super::request::RequestDescriptor;
use super::transport::{ApiTransport, CallError, HttpTransport};

/// Executes API calls with the pool's current key, rotating away from
/// exhausted keys and retrying.
///
/// The retry budget for one logical call equals the pool size (minimum 1):
/// every key gets one chance, and a pool where everything is exhausted can
/// never loop.
#[derive(Clone)]
pub struct YouTubeClient {
  transport: Arc<dyn ApiTransport>,
  pool: Arc<KeyPool>,
}

impl YouTubeClient {
  /// Client against the real API.
  pub fn new(pool: Arc<KeyPool>) -> Self {
    Self::with_transport(pool, Arc::new(HttpTransport::new()))
  }

  /// Client with a custom transport.
  pub fn with_transport(pool: Arc<KeyPool>, transport: Arc<dyn ApiTransport>) -> Self {
    Self { transport, pool }
  }

  /// Shared key pool handle.
  pub fn pool(&self) -> &Arc<KeyPool> {
    &self.pool
  }

  /// Execute one logical call, rotating keys on quota failures.
  pub async fn execute(&self, request: &RequestDescriptor) -> Result<Value, ServiceError> {
    let budget = self.pool.len().max(1);

    for attempt in 0..budget {
      let Some((index, key)) = self.pool.current_key() else {
        // Nothing usable: either the pool started out empty, or earlier
        // attempts (possibly a concurrent caller's) exhausted the rest.
        return Err(if attempt == 0 {
          ServiceError::NoKeyAvailable
        } else {
          ServiceError::AllKeysExhausted { attempts: attempt }
        });
      };

      match self.transport.execute(request, &key).await {
        Ok(response) => return Ok(response),
        Err(CallError::Quota { status, reason }) => {
          warn!(
            operation = request.operation,
            status,
            %reason,
            attempt,
            "key hit its limit; rotating"
          );
          self.pool.mark_exhausted(index);
        }
        Err(CallError::Upstream { status, message }) => {
          return Err(ServiceError::Upstream { status, message });
        }
        Err(CallError::Network(e)) => return Err(ServiceError::Network(e)),
      }
    }

    Err(ServiceError::AllKeysExhausted { attempts: budget })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  /// Transport that replays a scripted outcome per attempt and records the
  /// keys it was handed. Once the script runs out it keeps reporting quota
  /// failures.
  struct ScriptedTransport {
    outcomes: Mutex<Vec<Attempt>>,
    calls: AtomicUsize,
    keys_seen: Mutex<Vec<String>>,
  }

  enum Attempt {
    Ok(Value),
    Quota,
    Upstream(u16, &'static str),
  }

  impl ScriptedTransport {
    fn new(outcomes: Vec<Attempt>) -> Self {
      Self {
        outcomes: Mutex::new(outcomes),
        calls: AtomicUsize::new(0),
        keys_seen: Mutex::new(Vec::new()),
      }
    }

    fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl ApiTransport for ScriptedTransport {
    async fn execute(
      &self,
      _request: &RequestDescriptor,
      api_key: &str,
    ) -> Result<Value, CallError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.keys_seen.lock().unwrap().push(api_key.to_string());

      let mut outcomes = self.outcomes.lock().unwrap();
      let attempt = if outcomes.is_empty() {
        Attempt::Quota
      } else {
        outcomes.remove(0)
      };

      match attempt {
        Attempt::Ok(v) => Ok(v),
        Attempt::Quota => Err(CallError::Quota {
          status: 403,
          reason: "quotaExceeded".into(),
        }),
        Attempt::Upstream(status, message) => Err(CallError::Upstream {
          status,
          message: message.into(),
        }),
      }
    }
  }

  fn client(keys: &str, transport: Arc<ScriptedTransport>) -> YouTubeClient {
    YouTubeClient::with_transport(Arc::new(KeyPool::from_raw(keys)), transport)
  }

  #[tokio::test]
  async fn exhausts_every_key_then_stops() {
    let transport = Arc::new(ScriptedTransport::new(vec![]));
    let client = client("KEY_A\nKEY_B", Arc::clone(&transport));

    let err = client
      .execute(&RequestDescriptor::new("search"))
      .await
      .unwrap_err();

    assert!(matches!(err, ServiceError::AllKeysExhausted { attempts: 2 }));
    assert_eq!(transport.calls(), 2);
    assert_eq!(*transport.keys_seen.lock().unwrap(), vec!["KEY_A", "KEY_B"]);
  }

  #[tokio::test]
  async fn non_quota_failures_propagate_without_rotation() {
    let transport = Arc::new(ScriptedTransport::new(vec![Attempt::Upstream(
      404,
      "Video not found.",
    )]));
    let client = client("KEY_A\nKEY_B", Arc::clone(&transport));

    let err = client
      .execute(&RequestDescriptor::new("videos"))
      .await
      .unwrap_err();

    match err {
      ServiceError::Upstream { status, message } => {
        assert_eq!(status, 404);
        assert_eq!(message, "Video not found.");
      }
      other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(transport.calls(), 1);
    // The pool still points at the first key.
    assert_eq!(client.pool().current_key().map(|(i, _)| i), Some(0));
  }

  #[tokio::test]
  async fn rotates_past_a_limited_key_and_succeeds() {
    let transport = Arc::new(ScriptedTransport::new(vec![
      Attempt::Quota,
      Attempt::Ok(json!({"items": []})),
    ]));
    let client = client("KEY_A\nKEY_B", Arc::clone(&transport));

    let response = client
      .execute(&RequestDescriptor::new("search"))
      .await
      .unwrap();

    assert_eq!(response, json!({"items": []}));
    assert_eq!(transport.calls(), 2);
    assert_eq!(*transport.keys_seen.lock().unwrap(), vec!["KEY_A", "KEY_B"]);
  }

  #[tokio::test]
  async fn empty_pool_fails_before_any_call() {
    let transport = Arc::new(ScriptedTransport::new(vec![]));
    let client = client("", Arc::clone(&transport));

    let err = client
      .execute(&RequestDescriptor::new("search"))
      .await
      .unwrap_err();

    assert!(matches!(err, ServiceError::NoKeyAvailable));
    assert_eq!(transport.calls(), 0);
  }
}
