//! Game repository.
//!
//! Owns the game entity plus its relationship maps: `players`
//! (user -> true), `player_actor_map` (user -> actor id, nullable),
//! `actors_ref`, `agreements_ref` and `chats_ref`. The status state
//! machine is enforced here, before any store I/O.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use accord_domain::{ActorId, DeckId, Game, GameId, GameStatus, UserId};

use crate::infrastructure::ports::{Fields, IdentityPort, RepoError, StoreError};
use crate::infrastructure::store::{collections, fields, Path};

use super::RepoContext;

const KIND: &str = "Game";

/// Partial update; unset fields are left untouched. `deck_ref` follows
/// the double-Option pattern: `Some(None)` tombstones the deck link.
#[derive(Debug, Default, Clone)]
pub struct GameUpdate {
    pub name: Option<String>,
    pub deck_ref: Option<Option<DeckId>>,
}

pub struct GameRepository {
    ctx: RepoContext,
    identity: Arc<dyn IdentityPort>,
}

impl GameRepository {
    pub fn new(ctx: RepoContext, identity: Arc<dyn IdentityPort>) -> Self {
        Self { ctx, identity }
    }

    pub async fn create(&self, name: &str, deck: Option<DeckId>) -> Result<Game, RepoError> {
        if name.trim().is_empty() {
            return Err(RepoError::validation("game name must not be empty"));
        }
        let mut game = Game::new(name, self.ctx.clock.now());
        game.creator_ref = self.identity.current_principal_id();
        game.deck_ref = deck;

        let path = Path::entity(collections::GAMES, &game.id);
        if let Some(existing) = self.ctx.client.read(&path).await? {
            return Ok(decode(&game.id, &existing, &path)?);
        }
        self.ctx.client.write(&path, encode(&game)).await?;
        self.ctx.cache.invalidate(KIND, game.id.as_str());
        tracing::debug!(id = %game.id, "created game");
        Ok(game)
    }

    pub async fn get_by_id(&self, id: &GameId) -> Result<Game, RepoError> {
        let path = Path::entity(collections::GAMES, id);
        if let Some(cached) = self.ctx.cache.get(KIND, id.as_str()) {
            return Ok(decode(id, &cached, &path)?);
        }
        let raw = self
            .ctx
            .client
            .read(&path)
            .await?
            .ok_or_else(|| RepoError::not_found(KIND, id))?;
        let game = decode(id, &raw, &path)?;
        self.ctx.cache.insert(KIND, id.as_str(), raw);
        Ok(game)
    }

    pub async fn get_all(&self) -> Result<Vec<Game>, RepoError> {
        let root = Path::new(collections::GAMES);
        let mut games = Vec::new();
        for (key, raw) in self.ctx.client.read_all(&root).await? {
            let Ok(id) = GameId::parse(key) else { continue };
            match decode(&id, &raw, &Path::entity(collections::GAMES, &id)) {
                Ok(game) if !game.deleted => games.push(game),
                Ok(_) => {}
                Err(err) => tracing::warn!(id = %id, %err, "skipping undecodable game"),
            }
        }
        Ok(games)
    }

    pub async fn update(&self, id: &GameId, update: GameUpdate) -> Result<(), RepoError> {
        if matches!(&update.name, Some(n) if n.trim().is_empty()) {
            return Err(RepoError::validation("game name must not be empty"));
        }
        let path = Path::entity(collections::GAMES, id);
        let mut f = Fields::new();
        if let Some(name) = update.name {
            f.insert("name".into(), name.into());
        }
        match update.deck_ref {
            Some(Some(deck)) => {
                f.insert("deck_ref".into(), deck.as_str().into());
            }
            Some(None) => {
                f.insert("deck_ref".into(), Value::Null);
            }
            None => {}
        }
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(KIND, id.as_str());
        Ok(())
    }

    /// Advance the status state machine. Illegal transitions are
    /// rejected before any I/O; `force` is the explicit admin override.
    /// Re-asserting the current status is a no-op.
    pub async fn update_status(
        &self,
        id: &GameId,
        next: GameStatus,
        force: bool,
    ) -> Result<Game, RepoError> {
        let mut game = self.get_by_id(id).await?;
        if game.status == next {
            return Ok(game);
        }
        if !force && !game.status.can_transition_to(next) {
            return Err(RepoError::IllegalTransition {
                from: game.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        let now = self.ctx.clock.now();
        let path = Path::entity(collections::GAMES, id);
        let mut f = Fields::new();
        f.insert("status".into(), next.as_str().into());
        f.insert("updated_at".into(), now.to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(KIND, id.as_str());
        tracing::debug!(id = %id, from = game.status.as_str(), to = next.as_str(), "game status changed");
        game.status = next;
        game.updated_at = now;
        Ok(game)
    }

    pub async fn add_player(&self, game: &GameId, user: &UserId) -> Result<(), RepoError> {
        let path = Path::entity(collections::GAMES, game);
        self.ctx.edges.add_edge(&path, "players", user.as_str()).await?;
        Ok(())
    }

    pub async fn remove_player(&self, game: &GameId, user: &UserId) -> Result<(), RepoError> {
        let path = Path::entity(collections::GAMES, game);
        self.ctx
            .edges
            .remove_edge(&path, "players", user.as_str())
            .await?;
        self.ctx
            .edges
            .set_entry(&path, "player_actor_map", user.as_str(), Value::Null)
            .await?;
        Ok(())
    }

    pub async fn players(&self, game: &GameId) -> Result<Vec<UserId>, RepoError> {
        let path = Path::entity(collections::GAMES, game);
        let ids = self.ctx.edges.list_edges(&path, "players").await?;
        Ok(ids.into_iter().filter_map(|id| UserId::parse(id).ok()).collect())
    }

    /// Register an actor in the game without binding it to a player.
    /// Unclaimed role-template actors enter the game this way.
    pub async fn add_actor(&self, game: &GameId, actor: &ActorId) -> Result<(), RepoError> {
        let path = Path::entity(collections::GAMES, game);
        self.ctx
            .edges
            .add_edge(&path, "actors_ref", actor.as_str())
            .await?;
        Ok(())
    }

    /// Bind a player to the actor they control, registering the actor
    /// in `actors_ref` as well. `None` unbinds the player.
    pub async fn assign_actor(
        &self,
        game: &GameId,
        user: &UserId,
        actor: Option<&ActorId>,
    ) -> Result<(), RepoError> {
        let path = Path::entity(collections::GAMES, game);
        match actor {
            Some(actor) => {
                // Membership first: the assignment entry depends on it.
                self.ctx
                    .edges
                    .add_edge(&path, "actors_ref", actor.as_str())
                    .await?;
                self.ctx
                    .edges
                    .set_entry(
                        &path,
                        "player_actor_map",
                        user.as_str(),
                        Value::String(actor.as_str().to_string()),
                    )
                    .await?;
            }
            None => {
                self.ctx
                    .edges
                    .set_entry(&path, "player_actor_map", user.as_str(), Value::Null)
                    .await?;
            }
        }
        Ok(())
    }

    pub async fn actor_ids(&self, game: &GameId) -> Result<Vec<ActorId>, RepoError> {
        let path = Path::entity(collections::GAMES, game);
        let ids = self.ctx.edges.list_edges(&path, "actors_ref").await?;
        Ok(ids.into_iter().filter_map(|id| ActorId::parse(id).ok()).collect())
    }

    /// The user -> actor assignment map. Unassigned players map to None.
    pub async fn player_actor_map(
        &self,
        game: &GameId,
    ) -> Result<BTreeMap<UserId, Option<ActorId>>, RepoError> {
        let path = Path::entity(collections::GAMES, game).child("player_actor_map");
        let mut map = BTreeMap::new();
        if let Some(raw) = self.ctx.client.read(&path).await? {
            for (key, value) in raw {
                let Ok(user) = UserId::parse(key) else { continue };
                let actor = match value {
                    Value::String(s) => ActorId::parse(s).ok(),
                    _ => None,
                };
                map.insert(user, actor);
            }
        }
        Ok(map)
    }

    pub async fn soft_delete(&self, id: &GameId) -> Result<(), RepoError> {
        let path = Path::entity(collections::GAMES, id);
        let mut f = Fields::new();
        f.insert("deleted".into(), true.into());
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(KIND, id.as_str());
        tracing::debug!(id = %id, "soft-deleted game");
        Ok(())
    }
}

fn encode(game: &Game) -> Fields {
    let mut f = Fields::new();
    f.insert("name".into(), game.name.clone().into());
    if let Some(creator) = &game.creator_ref {
        f.insert("creator_ref".into(), creator.as_str().into());
    }
    if let Some(deck) = &game.deck_ref {
        f.insert("deck_ref".into(), deck.as_str().into());
    }
    f.insert("status".into(), game.status.as_str().into());
    if game.deleted {
        f.insert("deleted".into(), true.into());
    }
    f.insert("created_at".into(), game.created_at.to_rfc3339().into());
    f.insert("updated_at".into(), game.updated_at.to_rfc3339().into());
    f
}

fn decode(id: &GameId, raw: &Fields, path: &Path) -> Result<Game, StoreError> {
    let creator_ref = match fields::opt_str(raw, "creator_ref", path)? {
        Some(s) => Some(UserId::parse(s).map_err(|e| StoreError::decode(path, e.to_string()))?),
        None => None,
    };
    let deck_ref = match fields::opt_str(raw, "deck_ref", path)? {
        Some(s) => Some(DeckId::parse(s).map_err(|e| StoreError::decode(path, e.to_string()))?),
        None => None,
    };
    Ok(Game {
        id: id.clone(),
        name: fields::req_str(raw, "name", path)?,
        creator_ref,
        deck_ref,
        status: GameStatus::parse(&fields::req_str(raw, "status", path)?)
            .map_err(|e| StoreError::decode(path, e.to_string()))?,
        deleted: fields::flag(raw, "deleted"),
        created_at: fields::req_datetime(raw, "created_at", path)?,
        updated_at: fields::req_datetime(raw, "updated_at", path)?,
    })
}
