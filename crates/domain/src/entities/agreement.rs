//! Agreement entity - a negotiated obligation/benefit contract.
//!
//! `parties` maps each participating actor to a denormalized triple of
//! the card it plays plus its obligation and benefit text. The triple
//! is duplicated here so a single read renders the contract; the same
//! actor id must also be present (true) in the parent game's and each
//! referenced card's boolean maps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::ids::{ActorId, AgreementId, CardId, GameId};

/// Agreement lifecycle. Monotonic except for explicit rejection of a
/// proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    Proposed,
    Accepted,
    Rejected,
    Completed,
}

impl AgreementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "proposed" => Ok(Self::Proposed),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "completed" => Ok(Self::Completed),
            other => Err(DomainError::validation(format!(
                "unknown agreement status '{other}'"
            ))),
        }
    }

    pub fn can_transition_to(&self, next: AgreementStatus) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::Proposed, Self::Accepted)
                | (Self::Proposed, Self::Rejected)
                | (Self::Accepted, Self::Completed)
        )
    }
}

/// One actor's side of an agreement.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Party {
    pub card_ref: CardId,
    pub obligation: String,
    pub benefit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agreement {
    pub id: AgreementId,
    pub game_ref: GameId,
    pub parties: BTreeMap<ActorId, Party>,
    pub status: AgreementStatus,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agreement {
    pub fn new(game: GameId, parties: BTreeMap<ActorId, Party>, now: DateTime<Utc>) -> Self {
        Self {
            id: AgreementId::new(),
            game_ref: game,
            parties,
            status: AgreementStatus::Proposed,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_can_be_accepted_or_rejected() {
        assert!(AgreementStatus::Proposed.can_transition_to(AgreementStatus::Accepted));
        assert!(AgreementStatus::Proposed.can_transition_to(AgreementStatus::Rejected));
    }

    #[test]
    fn completion_requires_acceptance() {
        assert!(AgreementStatus::Accepted.can_transition_to(AgreementStatus::Completed));
        assert!(!AgreementStatus::Proposed.can_transition_to(AgreementStatus::Completed));
    }

    #[test]
    fn terminal_states_stay_terminal() {
        assert!(!AgreementStatus::Rejected.can_transition_to(AgreementStatus::Accepted));
        assert!(!AgreementStatus::Completed.can_transition_to(AgreementStatus::Proposed));
    }
}
