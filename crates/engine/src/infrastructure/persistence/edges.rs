//! Relationship index: boolean membership maps.
//!
//! An edge `A -[field]-> B` is one entry `field/<B>: true` under A's
//! path; removal writes a null tombstone. The store gives single-write
//! atomicity only, so logically bidirectional edges are two independent
//! calls made by the repositories (dependent side first); the
//! reconciliation pass repairs the window where only one side landed.
//!
//! High-cardinality maps shard into child nodes (`field/page_<n>`,
//! `field/day_<bucket>`). `list_edges` fans out over the unsharded map
//! node plus every shard and merges, deduplicated by id.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use crate::infrastructure::ports::{Fields, StoreError};
use crate::infrastructure::store::{fields, Path, StoreClient};

pub struct RelationshipIndex {
    client: Arc<StoreClient>,
}

impl RelationshipIndex {
    pub fn new(client: Arc<StoreClient>) -> Self {
        Self { client }
    }

    /// Add `field/<to_id>: true` under `from`.
    pub async fn add_edge(&self, from: &Path, field: &str, to_id: &str) -> Result<(), StoreError> {
        let mut entry = Fields::new();
        entry.insert(to_id.to_string(), Value::Bool(true));
        self.client.write(&from.child(field), entry).await?;
        tracing::debug!(from = %from, field, to_id, "edge added");
        Ok(())
    }

    /// Add an edge inside a named shard of the map
    /// (`field/<shard>/<to_id>: true`).
    pub async fn add_edge_in_shard(
        &self,
        from: &Path,
        field: &str,
        shard: &str,
        to_id: &str,
    ) -> Result<(), StoreError> {
        let mut entry = Fields::new();
        entry.insert(to_id.to_string(), Value::Bool(true));
        self.client
            .write(&from.child(field).child(shard), entry)
            .await?;
        tracing::debug!(from = %from, field, shard, to_id, "sharded edge added");
        Ok(())
    }

    /// Set a non-boolean map entry (`field/<key>: value`), e.g. a
    /// game's user-to-actor assignment. A null value tombstones the
    /// entry.
    pub async fn set_entry(
        &self,
        from: &Path,
        field: &str,
        key: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut entry = Fields::new();
        entry.insert(key.to_string(), value);
        self.client.write(&from.child(field), entry).await
    }

    /// Remove an edge wherever it lives: the unsharded map and any
    /// shard that contains it.
    pub async fn remove_edge(
        &self,
        from: &Path,
        field: &str,
        to_id: &str,
    ) -> Result<(), StoreError> {
        let map = from.child(field);
        self.client.tombstone(&map, [to_id]).await?;
        for (shard, entries) in self.client.read_all(&map).await? {
            if fields::flag(&entries, to_id) {
                self.client.tombstone(&map.child(&shard), [to_id]).await?;
            }
        }
        tracing::debug!(from = %from, field, to_id, "edge removed");
        Ok(())
    }

    /// All target ids in the map, merged across the unsharded node and
    /// every shard, deduplicated. Order is not meaningful.
    pub async fn list_edges(&self, from: &Path, field: &str) -> Result<Vec<String>, StoreError> {
        let map = from.child(field);
        let mut ids = BTreeSet::new();
        if let Some(entries) = self.client.read(&map).await? {
            ids.extend(fields::true_keys(&entries).cloned());
        }
        for (_, entries) in self.client.read_all(&map).await? {
            ids.extend(fields::true_keys(&entries).cloned());
        }
        Ok(ids.into_iter().collect())
    }

    /// Whether the edge is present on this side.
    pub async fn has_edge(&self, from: &Path, field: &str, to_id: &str) -> Result<bool, StoreError> {
        if let Some(entries) = self.client.read(&from.child(field)).await? {
            if fields::flag(&entries, to_id) {
                return Ok(true);
            }
        }
        for (_, entries) in self.client.read_all(&from.child(field)).await? {
            if fields::flag(&entries, to_id) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
