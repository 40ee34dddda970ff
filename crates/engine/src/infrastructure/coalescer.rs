//! Write coalescer for high-frequency position updates.
//!
//! Interactive dragging produces a burst of `set_position` calls per
//! node; only the last one within a quiet window matters. Each call
//! updates a pending-write entry and restarts that key's debounce
//! timer; the timer task that still matches the entry's generation
//! when it fires flushes the final value through the repository.
//! Keys are independent: dragging two nodes flushes two writes.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use accord_domain::GameId;

use crate::infrastructure::persistence::PositionRepository;

type Key = (GameId, String);

struct Pending {
    x: f64,
    y: f64,
    generation: u64,
}

pub struct PositionCoalescer {
    repo: Arc<PositionRepository>,
    window: Duration,
    pending: Arc<DashMap<Key, Pending>>,
}

impl PositionCoalescer {
    pub fn new(repo: Arc<PositionRepository>, window: Duration) -> Self {
        Self {
            repo,
            window,
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Record the latest coordinates for `(game, node)` and (re)arm the
    /// debounce timer. Returns immediately; the store write happens
    /// after the window elapses with no newer call for the same key.
    pub fn set_position(&self, game: &GameId, node_id: &str, x: f64, y: f64) {
        let key: Key = (game.clone(), node_id.to_string());
        let generation = {
            let mut entry = self.pending.entry(key.clone()).or_insert(Pending {
                x,
                y,
                generation: 0,
            });
            entry.x = x;
            entry.y = y;
            entry.generation += 1;
            entry.generation
        };

        let repo = Arc::clone(&self.repo);
        let pending = Arc::clone(&self.pending);
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Stale timer: a newer call bumped the generation and armed
            // its own task.
            let Some((_, entry)) = pending.remove_if(&key, |_, e| e.generation == generation)
            else {
                return;
            };
            if let Err(err) = repo.set(&key.0, &key.1, entry.x, entry.y).await {
                tracing::warn!(game = %key.0, node_id = %key.1, %err, "coalesced position write failed");
            }
        });
    }

    /// Write out everything still pending, ignoring timers. For
    /// shutdown paths.
    pub async fn flush_all(&self) {
        let keys: Vec<Key> = self.pending.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            let Some((_, entry)) = self.pending.remove(&key) else { continue };
            if let Err(err) = self.repo.set(&key.0, &key.1, entry.x, entry.y).await {
                tracing::warn!(game = %key.0, node_id = %key.1, %err, "flush write failed");
            }
        }
    }

    /// Number of keys with an unflushed write.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
