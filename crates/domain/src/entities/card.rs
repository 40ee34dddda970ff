//! Card entity - a role template.
//!
//! The core attributes (backstory, category) are immutable once
//! created; only the relationship maps (`values_ref`, `caps_ref`,
//! `agreements_ref`, `decks_ref`) change over a card's lifetime.

use chrono::{DateTime, Utc};

use crate::ids::CardId;

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub backstory: String,
    pub category: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    pub fn new(
        name: impl Into<String>,
        backstory: impl Into<String>,
        category: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CardId::new(),
            name: name.into(),
            backstory: backstory.into(),
            category: category.into(),
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}
