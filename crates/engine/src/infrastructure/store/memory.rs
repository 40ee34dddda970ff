//! In-process adapter of the path store contract.
//!
//! Implements the same semantics the real peer-replicated store
//! exposes: field-level merge on put, null tombstones, child streaming
//! with an end-of-stream signal, per-path change callbacks. Used by the
//! test suite and by embedders that want a single-process deployment.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::infrastructure::ports::{ChangeCallback, Fields, PathStore, StoreError};

use super::path::Path;

#[derive(Default)]
pub struct MemoryPathStore {
    nodes: DashMap<String, Fields>,
    subscribers: DashMap<String, Vec<(u64, ChangeCallback)>>,
    next_token: AtomicU64,
    puts: AtomicU64,
}

impl MemoryPathStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accepted puts. Test instrumentation for write
    /// amplification assertions.
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    fn notify(&self, path: &str, fields: &Fields) {
        if let Some(subs) = self.subscribers.get(path) {
            for (_, callback) in subs.iter() {
                callback(fields.clone());
            }
        }
    }
}

#[async_trait]
impl PathStore for MemoryPathStore {
    async fn get(&self, path: &Path) -> Result<Option<Fields>, StoreError> {
        Ok(self.nodes.get(path.as_str()).map(|n| n.clone()))
    }

    async fn put(&self, path: &Path, fields: Fields) -> Result<(), StoreError> {
        {
            let mut node = self.nodes.entry(path.as_str().to_string()).or_default();
            for (key, value) in &fields {
                if value.is_null() {
                    node.remove(key);
                } else {
                    node.insert(key.clone(), value.clone());
                }
            }
        }
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.notify(path.as_str(), &fields);
        Ok(())
    }

    async fn stream_children(
        &self,
        path: &Path,
    ) -> Result<mpsc::UnboundedReceiver<(String, Fields)>, StoreError> {
        let prefix = format!("{}/", path.as_str());
        let (tx, rx) = mpsc::unbounded_channel();
        for entry in self.nodes.iter() {
            if let Some(rest) = entry.key().strip_prefix(&prefix) {
                // Direct children only; deeper descendants have their
                // own parent paths.
                if !rest.is_empty() && !rest.contains('/') {
                    let _ = tx.send((rest.to_string(), entry.value().clone()));
                }
            }
        }
        // Dropping the sender closes the stream: end-of-stream signal.
        Ok(rx)
    }

    async fn subscribe(
        &self,
        path: &Path,
        callback: ChangeCallback,
    ) -> Result<u64, StoreError> {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .entry(path.as_str().to_string())
            .or_default()
            .push((token, callback));
        Ok(token)
    }

    async fn unsubscribe(&self, path: &Path, token: u64) {
        if let Some(mut subs) = self.subscribers.get_mut(path.as_str()) {
            subs.retain(|(t, _)| *t != token);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::infrastructure::store::fields::from_json;

    #[tokio::test]
    async fn put_merges_instead_of_replacing() {
        let store = MemoryPathStore::new();
        let path = Path::new("games/g_1");
        store
            .put(&path, from_json(json!({"a": 1})))
            .await
            .expect("put a");
        store
            .put(&path, from_json(json!({"b": 2})))
            .await
            .expect("put b");

        let fields = store.get(&path).await.expect("get").expect("present");
        assert_eq!(fields.get("a"), Some(&json!(1)));
        assert_eq!(fields.get("b"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn null_is_a_field_tombstone() {
        let store = MemoryPathStore::new();
        let path = Path::new("games/g_1");
        store
            .put(&path, from_json(json!({"a": 1, "b": 2})))
            .await
            .expect("put");
        store
            .put(&path, from_json(json!({"a": null})))
            .await
            .expect("tombstone");

        let fields = store.get(&path).await.expect("get").expect("present");
        assert!(fields.get("a").is_none());
        assert_eq!(fields.get("b"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn stream_children_yields_direct_children_only() {
        let store = MemoryPathStore::new();
        store
            .put(&Path::new("games/g_1"), from_json(json!({"name": "one"})))
            .await
            .expect("put");
        store
            .put(&Path::new("games/g_2"), from_json(json!({"name": "two"})))
            .await
            .expect("put");
        store
            .put(
                &Path::new("games/g_1/actors_ref"),
                from_json(json!({"actor_1": true})),
            )
            .await
            .expect("put");

        let mut rx = store
            .stream_children(&Path::new("games"))
            .await
            .expect("stream");
        let mut keys = Vec::new();
        while let Some((key, _)) = rx.recv().await {
            keys.push(key);
        }
        keys.sort();
        assert_eq!(keys, vec!["g_1", "g_2"]);
    }

    #[tokio::test]
    async fn subscribers_see_changes_until_unsubscribed() {
        let store = MemoryPathStore::new();
        let path = Path::new("positions/g_1/card_1");
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let token = store
            .subscribe(
                &path,
                Arc::new(move |_| {
                    seen.fetch_add(1, Ordering::Relaxed);
                }),
            )
            .await
            .expect("subscribe");

        store
            .put(&path, from_json(json!({"x": 1.0})))
            .await
            .expect("put");
        store.unsubscribe(&path, token).await;
        store
            .put(&path, from_json(json!({"x": 2.0})))
            .await
            .expect("put");

        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }
}
