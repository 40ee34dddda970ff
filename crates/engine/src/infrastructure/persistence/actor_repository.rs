//! Actor repository.
//!
//! Besides CRUD, owns the actor's `game_card_map` (game id -> card id)
//! and caches the resolved card per game under a context-scoped key so
//! repeated aggregate reads of the same game skip the map lookup.

use std::sync::Arc;

use serde_json::Value;

use accord_domain::{Actor, ActorId, AgreementId, CardId, GameId, UserId};

use crate::infrastructure::ports::{Fields, IdentityPort, RepoError, StoreError};
use crate::infrastructure::store::{collections, fields, Path};

use super::RepoContext;

const KIND: &str = "Actor";

#[derive(Debug, Default, Clone)]
pub struct ActorUpdate {
    pub name: Option<String>,
    pub user_ref: Option<Option<UserId>>,
}

pub struct ActorRepository {
    ctx: RepoContext,
    identity: Arc<dyn IdentityPort>,
}

impl ActorRepository {
    pub fn new(ctx: RepoContext, identity: Arc<dyn IdentityPort>) -> Self {
        Self { ctx, identity }
    }

    /// Create an actor owned by the current principal. Role-template
    /// seeding passes `owned = false` to leave it unclaimed.
    pub async fn create(&self, name: &str, owned: bool) -> Result<Actor, RepoError> {
        if name.trim().is_empty() {
            return Err(RepoError::validation("actor name must not be empty"));
        }
        let mut actor = Actor::new(name, self.ctx.clock.now());
        if owned {
            actor.user_ref = self.identity.current_principal_id();
        }
        let path = Path::entity(collections::ACTORS, &actor.id);
        if let Some(existing) = self.ctx.client.read(&path).await? {
            return Ok(decode(&actor.id, &existing, &path)?);
        }
        self.ctx.client.write(&path, encode(&actor)).await?;
        self.ctx.cache.invalidate(KIND, actor.id.as_str());
        tracing::debug!(id = %actor.id, "created actor");
        Ok(actor)
    }

    pub async fn get_by_id(&self, id: &ActorId) -> Result<Actor, RepoError> {
        let path = Path::entity(collections::ACTORS, id);
        if let Some(cached) = self.ctx.cache.get(KIND, id.as_str()) {
            return Ok(decode(id, &cached, &path)?);
        }
        let raw = self
            .ctx
            .client
            .read(&path)
            .await?
            .ok_or_else(|| RepoError::not_found(KIND, id))?;
        let actor = decode(id, &raw, &path)?;
        self.ctx.cache.insert(KIND, id.as_str(), raw);
        Ok(actor)
    }

    pub async fn get_all(&self) -> Result<Vec<Actor>, RepoError> {
        let root = Path::new(collections::ACTORS);
        let mut actors = Vec::new();
        for (key, raw) in self.ctx.client.read_all(&root).await? {
            let Ok(id) = ActorId::parse(key) else { continue };
            match decode(&id, &raw, &Path::entity(collections::ACTORS, &id)) {
                Ok(actor) if !actor.deleted => actors.push(actor),
                Ok(_) => {}
                Err(err) => tracing::warn!(id = %id, %err, "skipping undecodable actor"),
            }
        }
        Ok(actors)
    }

    pub async fn update(&self, id: &ActorId, update: ActorUpdate) -> Result<(), RepoError> {
        if matches!(&update.name, Some(n) if n.trim().is_empty()) {
            return Err(RepoError::validation("actor name must not be empty"));
        }
        let path = Path::entity(collections::ACTORS, id);
        let mut f = Fields::new();
        if let Some(name) = update.name {
            f.insert("name".into(), name.into());
        }
        match update.user_ref {
            Some(Some(user)) => {
                f.insert("user_ref".into(), user.as_str().into());
            }
            Some(None) => {
                f.insert("user_ref".into(), Value::Null);
            }
            None => {}
        }
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(KIND, id.as_str());
        Ok(())
    }

    /// Record which card this actor plays in the given game.
    pub async fn assign_card(
        &self,
        id: &ActorId,
        game: &GameId,
        card: Option<&CardId>,
    ) -> Result<(), RepoError> {
        let path = Path::entity(collections::ACTORS, id);
        let value = match card {
            Some(card) => Value::String(card.as_str().to_string()),
            None => Value::Null,
        };
        self.ctx
            .edges
            .set_entry(&path, "game_card_map", game.as_str(), value)
            .await?;
        // The plain entry is untouched but the per-game derived view is
        // now stale.
        self.ctx
            .cache
            .invalidate_scoped(KIND, id.as_str(), game.as_str());
        Ok(())
    }

    /// The card this actor currently plays in `game`, if any.
    pub async fn current_card(
        &self,
        id: &ActorId,
        game: &GameId,
    ) -> Result<Option<CardId>, RepoError> {
        if let Some(cached) = self.ctx.cache.get_scoped(KIND, id.as_str(), game.as_str()) {
            return Ok(match fields::opt_str(&cached, "card_ref", &Path::new("cache"))? {
                Some(s) => CardId::parse(s).ok(),
                None => None,
            });
        }
        let path = Path::entity(collections::ACTORS, id).child("game_card_map");
        let raw = self.ctx.client.read(&path).await?.unwrap_or_default();
        let card = match raw.get(game.as_str()) {
            Some(Value::String(s)) => CardId::parse(s.clone()).ok(),
            _ => None,
        };
        let mut scoped = Fields::new();
        if let Some(card) = &card {
            scoped.insert("card_ref".into(), card.as_str().into());
        }
        self.ctx
            .cache
            .insert_scoped(KIND, id.as_str(), game.as_str(), scoped);
        Ok(card)
    }

    pub async fn agreement_ids(&self, id: &ActorId) -> Result<Vec<AgreementId>, RepoError> {
        let path = Path::entity(collections::ACTORS, id);
        let ids = self.ctx.edges.list_edges(&path, "agreements_ref").await?;
        Ok(ids
            .into_iter()
            .filter_map(|id| AgreementId::parse(id).ok())
            .collect())
    }

    pub async fn soft_delete(&self, id: &ActorId) -> Result<(), RepoError> {
        let path = Path::entity(collections::ACTORS, id);
        self.ctx.client.tombstone(&path, ["user_ref"]).await?;
        let mut f = Fields::new();
        f.insert("deleted".into(), true.into());
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(KIND, id.as_str());
        tracing::debug!(id = %id, "soft-deleted actor");
        Ok(())
    }
}

fn encode(actor: &Actor) -> Fields {
    let mut f = Fields::new();
    f.insert("name".into(), actor.name.clone().into());
    if let Some(user) = &actor.user_ref {
        f.insert("user_ref".into(), user.as_str().into());
    }
    if actor.deleted {
        f.insert("deleted".into(), true.into());
    }
    f.insert("created_at".into(), actor.created_at.to_rfc3339().into());
    f.insert("updated_at".into(), actor.updated_at.to_rfc3339().into());
    f
}

fn decode(id: &ActorId, raw: &Fields, path: &Path) -> Result<Actor, StoreError> {
    let user_ref = match fields::opt_str(raw, "user_ref", path)? {
        Some(s) => Some(UserId::parse(s).map_err(|e| StoreError::decode(path, e.to_string()))?),
        None => None,
    };
    Ok(Actor {
        id: id.clone(),
        name: fields::req_str(raw, "name", path)?,
        user_ref,
        deleted: fields::flag(raw, "deleted"),
        created_at: fields::req_datetime(raw, "created_at", path)?,
        updated_at: fields::req_datetime(raw, "updated_at", path)?,
    })
}
