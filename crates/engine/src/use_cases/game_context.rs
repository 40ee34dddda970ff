//! Full game context assembly.
//!
//! A game view needs the game, its actors with their current cards,
//! its agreements with the referenced cards, and derived deck counts -
//! four dependent read waves against a store with no joins. All
//! independent reads in a wave run concurrently, each bounded by the
//! step deadline; a child that does not resolve in time is included as
//! an explicit `Unresolved` marker instead of failing the aggregate.
//! Partial data beats no data for this read-mostly view. Only the game
//! itself is load-bearing: if it is missing there is no context to
//! build and the load fails.

use std::collections::BTreeSet;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::timeout;

use accord_domain::{Actor, Agreement, AgreementId, ActorId, Card, CardId, Game, GameId};

use crate::config::EngineConfig;
use crate::infrastructure::persistence::Repositories;
use crate::infrastructure::ports::RepoError;

/// A child reference that either resolved or is carried as its raw id.
/// UI layers render unresolved entries as "unavailable" placeholders.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<T> {
    Found(T),
    Unresolved(String),
}

impl<T> Resolved<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Unresolved(_) => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActorEntry {
    pub actor: Actor,
    /// The card the actor plays in this game, if assigned.
    pub card: Option<Resolved<Card>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgreementEntry {
    pub agreement: Agreement,
    /// Distinct cards referenced by the agreement's parties.
    pub cards: Vec<Resolved<Card>>,
}

/// Derived deck usage for the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckCounts {
    pub total: usize,
    pub used: usize,
    pub available: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameContext {
    pub game: Game,
    pub actors: Vec<Resolved<ActorEntry>>,
    pub agreements: Vec<Resolved<AgreementEntry>>,
    pub deck: Option<DeckCounts>,
    /// True when any child reference is unresolved.
    pub partial: bool,
}

pub struct GameContextLoader {
    repos: Repositories,
    step_deadline: Duration,
}

impl GameContextLoader {
    pub fn new(repos: Repositories, config: &EngineConfig) -> Self {
        Self {
            repos,
            step_deadline: config.step_deadline,
        }
    }

    pub async fn load(&self, game_id: &GameId) -> Result<GameContext, RepoError> {
        let game = self.repos.games.get_by_id(game_id).await?;
        if game.deleted {
            return Err(RepoError::not_found("Game", game_id));
        }

        let actor_ids = self.repos.games.actor_ids(game_id).await?;
        let actors = join_all(
            actor_ids
                .iter()
                .map(|id| self.load_actor_entry(game_id, id)),
        )
        .await;

        let agreement_ids = self.repos.agreements.list_for_game(game_id).await?;
        let agreements = join_all(
            agreement_ids
                .iter()
                .map(|id| self.load_agreement_entry(id)),
        )
        .await;

        let mut partial = actors.iter().any(Resolved::is_unresolved)
            || agreements.iter().any(|a| match a {
                Resolved::Unresolved(_) => true,
                Resolved::Found(entry) => entry.cards.iter().any(Resolved::is_unresolved),
            })
            || actors
                .iter()
                .filter_map(Resolved::found)
                .any(|e| matches!(e.card, Some(Resolved::Unresolved(_))));

        let deck = match self.load_deck_counts(&game, &actors).await {
            Ok(counts) => counts,
            Err(err) => {
                tracing::warn!(game = %game_id, %err, "deck counts unavailable");
                partial = true;
                None
            }
        };

        Ok(GameContext {
            game,
            actors,
            agreements,
            deck,
            partial,
        })
    }

    async fn load_actor_entry(&self, game: &GameId, id: &ActorId) -> Resolved<ActorEntry> {
        let load = async {
            let actor = self.repos.actors.get_by_id(id).await?;
            let card = match self.repos.actors.current_card(id, game).await? {
                Some(card_id) => Some(self.resolve_card(&card_id).await),
                None => None,
            };
            Ok::<_, RepoError>(ActorEntry { actor, card })
        };
        match timeout(self.step_deadline, load).await {
            Ok(Ok(entry)) => Resolved::Found(entry),
            Ok(Err(err)) => {
                tracing::warn!(actor = %id, %err, "actor reference did not resolve");
                Resolved::Unresolved(id.as_str().to_string())
            }
            Err(_) => {
                tracing::warn!(actor = %id, "actor read exceeded step deadline");
                Resolved::Unresolved(id.as_str().to_string())
            }
        }
    }

    async fn load_agreement_entry(&self, id: &AgreementId) -> Resolved<AgreementEntry> {
        let load = async {
            let agreement = self.repos.agreements.get_by_id(id).await?;
            let card_ids: BTreeSet<CardId> = agreement
                .parties
                .values()
                .map(|p| p.card_ref.clone())
                .collect();
            let cards =
                join_all(card_ids.iter().map(|card_id| self.resolve_card(card_id))).await;
            Ok::<_, RepoError>(AgreementEntry { agreement, cards })
        };
        match timeout(self.step_deadline, load).await {
            Ok(Ok(entry)) => Resolved::Found(entry),
            Ok(Err(err)) => {
                tracing::warn!(agreement = %id, %err, "agreement reference did not resolve");
                Resolved::Unresolved(id.as_str().to_string())
            }
            Err(_) => {
                tracing::warn!(agreement = %id, "agreement read exceeded step deadline");
                Resolved::Unresolved(id.as_str().to_string())
            }
        }
    }

    async fn resolve_card(&self, id: &CardId) -> Resolved<Card> {
        match timeout(self.step_deadline, self.repos.cards.get_by_id(id)).await {
            Ok(Ok(card)) => Resolved::Found(card),
            Ok(Err(err)) => {
                tracing::warn!(card = %id, %err, "card reference did not resolve");
                Resolved::Unresolved(id.as_str().to_string())
            }
            Err(_) => {
                tracing::warn!(card = %id, "card read exceeded step deadline");
                Resolved::Unresolved(id.as_str().to_string())
            }
        }
    }

    /// total = deck size, used = distinct cards assigned to this game's
    /// actors, available = the difference.
    async fn load_deck_counts(
        &self,
        game: &Game,
        actors: &[Resolved<ActorEntry>],
    ) -> Result<Option<DeckCounts>, RepoError> {
        let Some(deck_id) = &game.deck_ref else {
            return Ok(None);
        };
        let deck_cards = self.repos.decks.card_ids(deck_id).await?;
        let assigned: BTreeSet<&str> = actors
            .iter()
            .filter_map(Resolved::found)
            .filter_map(|e| e.card.as_ref())
            .filter_map(|c| c.found())
            .map(|card| card.id.as_str())
            .collect();
        let total = deck_cards.len();
        let used = deck_cards
            .iter()
            .filter(|id| assigned.contains(id.as_str()))
            .count();
        Ok(Some(DeckCounts {
            total,
            used,
            available: total.saturating_sub(used),
        }))
    }
}
