//! Port traits for external collaborators.
//!
//! `PathStore` is the raw contract of the underlying peer-replicated
//! store: path-addressed field maps, merge-on-write, null tombstones,
//! no transactions, no delivery guarantee. Everything above it goes
//! through `StoreClient`, which adds deadlines and typed decoding.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use accord_domain::UserId;

use super::error::{NotifyError, StoreError};
use crate::infrastructure::store::Path;

/// One node's fields as stored: field name to JSON value. A `null`
/// value written through `put` is a tombstone deleting that field.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Callback invoked with a node's changed fields.
pub type ChangeCallback = Arc<dyn Fn(Fields) + Send + Sync>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PathStore: Send + Sync {
    /// Read the node at `path`. `None` means the store answered and the
    /// node is absent; a store that stays silent is handled by the
    /// client's deadline, not here.
    async fn get(&self, path: &Path) -> Result<Option<Fields>, StoreError>;

    /// Merge `fields` into the node at `path`. Sibling fields are left
    /// untouched; null values delete their field.
    async fn put(&self, path: &Path, fields: Fields) -> Result<(), StoreError>;

    /// Stream the direct children of `path` as `(child_key, fields)`.
    /// The stream is lazy, finite and non-restartable; the sender side
    /// closing is the end-of-stream signal.
    async fn stream_children(
        &self,
        path: &Path,
    ) -> Result<mpsc::UnboundedReceiver<(String, Fields)>, StoreError>;

    /// Register `callback` for changes under `path`. Returns a token
    /// for `unsubscribe`.
    async fn subscribe(&self, path: &Path, callback: ChangeCallback)
        -> Result<u64, StoreError>;

    async fn unsubscribe(&self, path: &Path, token: u64);
}

/// Wall-clock source used to stamp `created_at`/`updated_at`.
#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Authenticated principal supplied by the external identity provider.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityPort: Send + Sync {
    fn current_principal_id(&self) -> Option<UserId>;
}

/// Outbound notification service. Fire-and-forget from this layer's
/// perspective: failures are logged by callers, never propagated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierPort: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}
