//! Deck entity - a named collection of cards.
//!
//! Membership is a boolean map sharded into `cards_ref/page_<n>` nodes;
//! `cards_count` tracks how many cards have been added so the next page
//! can be picked without scanning every shard.

use chrono::{DateTime, Utc};

use crate::ids::DeckId;

#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub cards_count: u64,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: DeckId::new(),
            name: name.into(),
            cards_count: 0,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}
