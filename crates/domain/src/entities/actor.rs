//! Actor entity - a persistent role-identity owned by a user.
//!
//! An actor's per-game card assignment lives in the `game_card_map` map
//! node under the actor's path (game id -> card id). Actors seeded from
//! role templates start unowned (`user_ref` = None) until a player
//! claims them.

use chrono::{DateTime, Utc};

use crate::ids::{ActorId, UserId};

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub user_ref: Option<UserId>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Actor {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            user_ref: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_owner(mut self, user: UserId) -> Self {
        self.user_ref = Some(user);
        self
    }
}
