//! Deadline-bounded client over the raw path store.
//!
//! Every read resolves within its deadline: the underlying store has no
//! delivery guarantee, so silence past the deadline is indistinguishable
//! from emptiness and is answered as absent rather than hanging the
//! caller. Writes are field-level merges; deletion is an explicit null
//! tombstone per field.

use std::sync::Arc;

use serde_json::Value;
use tokio::time::{timeout, Instant};

use crate::config::EngineConfig;
use crate::infrastructure::ports::{ChangeCallback, Fields, PathStore, StoreError};

use super::path::Path;

#[derive(Clone)]
pub struct StoreClient {
    store: Arc<dyn PathStore>,
    read_deadline: std::time::Duration,
    scan_deadline: std::time::Duration,
}

impl StoreClient {
    pub fn new(store: Arc<dyn PathStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            read_deadline: config.read_deadline,
            scan_deadline: config.scan_deadline,
        }
    }

    /// Read one node. A read that outlives the deadline resolves to
    /// absent, never hangs.
    pub async fn read(&self, path: &Path) -> Result<Option<Fields>, StoreError> {
        match timeout(self.read_deadline, self.store.get(path)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(path = %path, "read deadline elapsed, treating as absent");
                Ok(None)
            }
        }
    }

    /// Drain the child stream under `path`, bounded by the scan
    /// deadline. Children that arrive after the deadline are dropped;
    /// whatever was collected so far is returned.
    pub async fn read_all(&self, path: &Path) -> Result<Vec<(String, Fields)>, StoreError> {
        let mut rx = match timeout(self.read_deadline, self.store.stream_children(path)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::debug!(path = %path, "child stream did not open before deadline");
                return Ok(Vec::new());
            }
        };

        let deadline = Instant::now() + self.scan_deadline;
        let mut children = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, rx.recv()).await {
                Ok(Some(child)) => children.push(child),
                Ok(None) => break,
                Err(_) => {
                    tracing::debug!(
                        path = %path,
                        collected = children.len(),
                        "scan deadline elapsed, returning partial children"
                    );
                    break;
                }
            }
        }
        Ok(children)
    }

    /// Merge `fields` into the node at `path`. Sibling fields survive.
    pub async fn write(&self, path: &Path, fields: Fields) -> Result<(), StoreError> {
        self.store.put(path, fields).await
    }

    /// Delete fields by writing null tombstones, the only deletion the
    /// store understands.
    pub async fn tombstone<I, S>(&self, path: &Path, field_names: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields = Fields::new();
        for name in field_names {
            fields.insert(name.into(), Value::Null);
        }
        self.store.put(path, fields).await
    }

    /// Subscribe to changes under `path`. Dropping the returned guard
    /// cancels the subscription.
    pub async fn subscribe(
        &self,
        path: &Path,
        callback: ChangeCallback,
    ) -> Result<Subscription, StoreError> {
        let token = self.store.subscribe(path, callback).await?;
        Ok(Subscription {
            store: Arc::clone(&self.store),
            path: path.clone(),
            token: Some(token),
        })
    }
}

/// Live subscription handle; cancel-on-drop.
pub struct Subscription {
    store: Arc<dyn PathStore>,
    path: Path,
    token: Option<u64>,
}

impl Subscription {
    /// Cancel explicitly instead of relying on drop.
    pub async fn cancel(mut self) {
        if let Some(token) = self.token.take() {
            self.store.unsubscribe(&self.path, token).await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            let store = Arc::clone(&self.store);
            let path = self.path.clone();
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    store.unsubscribe(&path, token).await;
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;
    use crate::infrastructure::store::fields::from_json;
    use serde_json::json;

    /// A store that never answers, standing in for an unreachable peer.
    struct SilentStore;

    #[async_trait]
    impl PathStore for SilentStore {
        async fn get(&self, _path: &Path) -> Result<Option<Fields>, StoreError> {
            std::future::pending().await
        }

        async fn put(&self, _path: &Path, _fields: Fields) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn stream_children(
            &self,
            _path: &Path,
        ) -> Result<mpsc::UnboundedReceiver<(String, Fields)>, StoreError> {
            // The stream opens but never produces a child or closes.
            let (tx, rx) = mpsc::unbounded_channel();
            std::mem::forget(tx);
            Ok(rx)
        }

        async fn subscribe(
            &self,
            _path: &Path,
            _callback: ChangeCallback,
        ) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn unsubscribe(&self, _path: &Path, _token: u64) {}
    }

    fn fast_config() -> EngineConfig {
        EngineConfig {
            read_deadline: Duration::from_millis(50),
            scan_deadline: Duration::from_millis(50),
            ..EngineConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn silent_read_resolves_to_absent() {
        let client = StoreClient::new(Arc::new(SilentStore), &fast_config());
        let result = client.read(&Path::new("games/g_1")).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_scan_returns_partial_children() {
        let client = StoreClient::new(Arc::new(SilentStore), &fast_config());
        let children = client
            .read_all(&Path::new("games"))
            .await
            .expect("scan should not error");
        assert!(children.is_empty());
    }

    #[tokio::test]
    async fn tombstone_writes_nulls() {
        let store = Arc::new(crate::infrastructure::store::MemoryPathStore::new());
        let client = StoreClient::new(store, &EngineConfig::default());
        let path = Path::new("users/u_1");
        client
            .write(&path, from_json(json!({"name": "ada", "email": "a@b.c"})))
            .await
            .expect("write");
        client.tombstone(&path, ["email"]).await.expect("tombstone");

        let fields = client.read(&path).await.expect("read").expect("present");
        assert_eq!(fields.get("name"), Some(&json!("ada")));
        assert!(fields.get("email").is_none());
    }
}
