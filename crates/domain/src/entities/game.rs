//! Game entity - a play session.
//!
//! The game's relationship maps (`players`, `actors_ref`,
//! `agreements_ref`, `chats_ref`, `player_actor_map`) live as map nodes
//! under the game's path, not on this struct; the repository and the
//! relationship index maintain them.

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::ids::{DeckId, GameId, UserId};

/// Game lifecycle. Transitions only move forward, except that an active
/// game may pause and resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Created,
    Setup,
    Active,
    Paused,
    Completed,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Setup => "setup",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "created" => Ok(Self::Created),
            "setup" => Ok(Self::Setup),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            other => Err(DomainError::validation(format!("unknown game status '{other}'"))),
        }
    }

    /// Whether `next` is a legal forward move from this status.
    /// Re-asserting the current status is allowed and treated as a no-op
    /// by callers.
    pub fn can_transition_to(&self, next: GameStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::Created, Self::Setup)
                | (Self::Setup, Self::Active)
                | (Self::Active, Self::Paused)
                | (Self::Active, Self::Completed)
                | (Self::Paused, Self::Active)
                | (Self::Paused, Self::Completed)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub creator_ref: Option<UserId>,
    pub deck_ref: Option<DeckId>,
    pub status: GameStatus,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: GameId::new(),
            name: name.into(),
            creator_ref: None,
            deck_ref: None,
            status: GameStatus::Created,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_creator(mut self, creator: UserId) -> Self {
        self.creator_ref = Some(creator);
        self
    }

    pub fn with_deck(mut self, deck: DeckId) -> Self {
        self.deck_ref = Some(deck);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_allowed() {
        assert!(GameStatus::Created.can_transition_to(GameStatus::Setup));
        assert!(GameStatus::Setup.can_transition_to(GameStatus::Active));
        assert!(GameStatus::Active.can_transition_to(GameStatus::Paused));
        assert!(GameStatus::Paused.can_transition_to(GameStatus::Active));
        assert!(GameStatus::Active.can_transition_to(GameStatus::Completed));
        assert!(GameStatus::Paused.can_transition_to(GameStatus::Completed));
    }

    #[test]
    fn backward_transitions_rejected() {
        assert!(!GameStatus::Completed.can_transition_to(GameStatus::Active));
        assert!(!GameStatus::Active.can_transition_to(GameStatus::Setup));
        assert!(!GameStatus::Setup.can_transition_to(GameStatus::Created));
        assert!(!GameStatus::Created.can_transition_to(GameStatus::Active));
    }

    #[test]
    fn reassert_current_status_is_allowed() {
        assert!(GameStatus::Active.can_transition_to(GameStatus::Active));
    }
}
