//! Process-local entity cache.
//!
//! Memoizes recently read field maps keyed by `(kind, id)`, with an
//! optional context id for derived views scoped to another entity
//! (e.g. an actor's card within one game). There is no time-based
//! expiry: staleness is bounded only by explicit invalidation, so every
//! mutating path must clear the keys it could have affected -
//! `invalidate` therefore also sweeps all context-scoped keys of the
//! same entity.
//!
//! Backed by a sharded concurrent map so unrelated lookups never
//! serialize on one lock.

use dashmap::DashMap;

use crate::infrastructure::ports::Fields;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: &'static str,
    id: String,
    context: Option<String>,
}

impl CacheKey {
    fn plain(kind: &'static str, id: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
            context: None,
        }
    }

    fn scoped(kind: &'static str, id: &str, context: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
            context: Some(context.to_string()),
        }
    }
}

#[derive(Default)]
pub struct EntityCache {
    entries: DashMap<CacheKey, Fields>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: &'static str, id: &str) -> Option<Fields> {
        self.entries.get(&CacheKey::plain(kind, id)).map(|e| e.clone())
    }

    pub fn get_scoped(&self, kind: &'static str, id: &str, context: &str) -> Option<Fields> {
        self.entries
            .get(&CacheKey::scoped(kind, id, context))
            .map(|e| e.clone())
    }

    pub fn insert(&self, kind: &'static str, id: &str, fields: Fields) {
        self.entries.insert(CacheKey::plain(kind, id), fields);
    }

    pub fn insert_scoped(&self, kind: &'static str, id: &str, context: &str, fields: Fields) {
        self.entries
            .insert(CacheKey::scoped(kind, id, context), fields);
    }

    /// Drop the plain entry and every context-scoped entry for this
    /// entity.
    pub fn invalidate(&self, kind: &'static str, id: &str) {
        self.entries
            .retain(|key, _| !(key.kind == kind && key.id == id));
    }

    /// Drop one context-scoped entry.
    pub fn invalidate_scoped(&self, kind: &'static str, id: &str, context: &str) {
        self.entries.remove(&CacheKey::scoped(kind, id, context));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::infrastructure::store::fields::from_json;

    #[test]
    fn insert_and_get() {
        let cache = EntityCache::new();
        cache.insert("Game", "g_1", from_json(json!({"name": "one"})));
        assert!(cache.get("Game", "g_1").is_some());
        assert!(cache.get("Game", "g_2").is_none());
        assert!(cache.get("Card", "g_1").is_none());
    }

    #[test]
    fn scoped_entries_are_independent() {
        let cache = EntityCache::new();
        cache.insert_scoped("Actor", "actor_1", "g_1", from_json(json!({"card_ref": "card_1"})));
        cache.insert_scoped("Actor", "actor_1", "g_2", from_json(json!({"card_ref": "card_2"})));

        let in_g1 = cache.get_scoped("Actor", "actor_1", "g_1").expect("g_1 entry");
        assert_eq!(in_g1.get("card_ref"), Some(&json!("card_1")));
        assert!(cache.get("Actor", "actor_1").is_none());
    }

    #[test]
    fn invalidate_sweeps_scoped_keys_too() {
        let cache = EntityCache::new();
        cache.insert("Actor", "actor_1", from_json(json!({"name": "a"})));
        cache.insert_scoped("Actor", "actor_1", "g_1", from_json(json!({"card_ref": "card_1"})));
        cache.insert("Actor", "actor_2", from_json(json!({"name": "b"})));

        cache.invalidate("Actor", "actor_1");

        assert!(cache.get("Actor", "actor_1").is_none());
        assert!(cache.get_scoped("Actor", "actor_1", "g_1").is_none());
        assert!(cache.get("Actor", "actor_2").is_some());
    }

    #[test]
    fn invalidate_scoped_leaves_plain_entry() {
        let cache = EntityCache::new();
        cache.insert("Actor", "actor_1", from_json(json!({"name": "a"})));
        cache.insert_scoped("Actor", "actor_1", "g_1", from_json(json!({"card_ref": "card_1"})));

        cache.invalidate_scoped("Actor", "actor_1", "g_1");

        assert!(cache.get("Actor", "actor_1").is_some());
        assert!(cache.get_scoped("Actor", "actor_1", "g_1").is_none());
    }
}
