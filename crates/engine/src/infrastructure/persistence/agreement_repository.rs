//! Agreement repository.
//!
//! The `parties` map is denormalized: each entry duplicates the card
//! reference and the obligation/benefit text so one read renders the
//! contract. Creating an agreement also registers it in the parent
//! game's, each actor's and each referenced card's boolean maps; those
//! membership edges are written first so the invariant already holds
//! when the agreement itself becomes readable.

use std::collections::BTreeMap;
use std::sync::Arc;

use accord_domain::{
    ActorId, Agreement, AgreementId, AgreementStatus, CardId, GameId, Party, UserId,
};

use crate::infrastructure::ports::{Fields, NotifierPort, RepoError, StoreError};
use crate::infrastructure::store::{collections, fields, Path};

use super::RepoContext;

const KIND: &str = "Agreement";

pub struct AgreementRepository {
    ctx: RepoContext,
    notifier: Arc<dyn NotifierPort>,
}

impl AgreementRepository {
    pub fn new(ctx: RepoContext, notifier: Arc<dyn NotifierPort>) -> Self {
        Self { ctx, notifier }
    }

    pub async fn create(
        &self,
        game: &GameId,
        parties: BTreeMap<ActorId, Party>,
    ) -> Result<Agreement, RepoError> {
        if parties.is_empty() {
            return Err(RepoError::validation("an agreement needs at least one party"));
        }
        for (actor, party) in &parties {
            if party.obligation.trim().is_empty() && party.benefit.trim().is_empty() {
                return Err(RepoError::validation(format!(
                    "party {actor} must state an obligation or a benefit"
                )));
            }
        }

        // Every party must already be an actor of the game; refusing
        // here keeps the dual-sided membership maps closed under the
        // game's own actor roster.
        let game_path = Path::entity(collections::GAMES, game);
        for actor in parties.keys() {
            if !self
                .ctx
                .edges
                .has_edge(&game_path, "actors_ref", actor.as_str())
                .await?
            {
                return Err(RepoError::validation(format!(
                    "party {actor} is not an actor of game {game}"
                )));
            }
        }

        let agreement = Agreement::new(game.clone(), parties, self.ctx.clock.now());
        let path = Path::entity(collections::AGREEMENTS, &agreement.id);
        if let Some(existing) = self.ctx.client.read(&path).await? {
            return Ok(self.decode_full(&agreement.id, existing, &path).await?);
        }

        // Membership edges first: the parties map depends on them.
        self.ctx
            .edges
            .add_edge(&game_path, "agreements_ref", agreement.id.as_str())
            .await?;
        for (actor, party) in &agreement.parties {
            let actor_path = Path::entity(collections::ACTORS, actor);
            self.ctx
                .edges
                .add_edge(&actor_path, "agreements_ref", agreement.id.as_str())
                .await?;
            let card_path = Path::entity(collections::CARDS, &party.card_ref);
            self.ctx
                .edges
                .add_edge(&card_path, "agreements_ref", agreement.id.as_str())
                .await?;
        }

        for (actor, party) in &agreement.parties {
            self.ctx
                .client
                .write(&path.child("parties").child(actor.as_str()), encode_party(party))
                .await?;
        }
        self.ctx.client.write(&path, encode(&agreement)).await?;
        self.ctx.cache.invalidate(KIND, agreement.id.as_str());
        tracing::debug!(id = %agreement.id, game = %game, "created agreement");

        self.notify_parties(&agreement, "New agreement proposed").await;
        Ok(agreement)
    }

    pub async fn get_by_id(&self, id: &AgreementId) -> Result<Agreement, RepoError> {
        let path = Path::entity(collections::AGREEMENTS, id);
        let raw = match self.ctx.cache.get(KIND, id.as_str()) {
            Some(cached) => cached,
            None => self
                .ctx
                .client
                .read(&path)
                .await?
                .ok_or_else(|| RepoError::not_found(KIND, id))?,
        };
        self.decode_full(id, raw, &path).await
    }

    pub async fn get_all(&self) -> Result<Vec<Agreement>, RepoError> {
        let root = Path::new(collections::AGREEMENTS);
        let mut agreements = Vec::new();
        for (key, raw) in self.ctx.client.read_all(&root).await? {
            let Ok(id) = AgreementId::parse(key) else { continue };
            let path = Path::entity(collections::AGREEMENTS, &id);
            match self.decode_full(&id, raw, &path).await {
                Ok(ag) if !ag.deleted => agreements.push(ag),
                Ok(_) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => tracing::warn!(id = %id, %err, "skipping undecodable agreement"),
            }
        }
        Ok(agreements)
    }

    /// Move the agreement along its lifecycle. Monotonic except that a
    /// proposal may be rejected; anything else is refused before I/O.
    pub async fn update_status(
        &self,
        id: &AgreementId,
        next: AgreementStatus,
    ) -> Result<Agreement, RepoError> {
        let mut agreement = self.get_by_id(id).await?;
        if agreement.status == next {
            return Ok(agreement);
        }
        if !agreement.status.can_transition_to(next) {
            return Err(RepoError::IllegalTransition {
                from: agreement.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        let now = self.ctx.clock.now();
        let path = Path::entity(collections::AGREEMENTS, id);
        let mut f = Fields::new();
        f.insert("status".into(), next.as_str().into());
        f.insert("updated_at".into(), now.to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(KIND, id.as_str());
        tracing::debug!(id = %id, to = next.as_str(), "agreement status changed");

        agreement.status = next;
        agreement.updated_at = now;
        if next == AgreementStatus::Accepted {
            self.notify_parties(&agreement, "Agreement accepted").await;
        }
        Ok(agreement)
    }

    pub async fn list_for_game(&self, game: &GameId) -> Result<Vec<AgreementId>, RepoError> {
        let path = Path::entity(collections::GAMES, game);
        let ids = self.ctx.edges.list_edges(&path, "agreements_ref").await?;
        Ok(ids
            .into_iter()
            .filter_map(|id| AgreementId::parse(id).ok())
            .collect())
    }

    pub async fn soft_delete(&self, id: &AgreementId) -> Result<(), RepoError> {
        let path = Path::entity(collections::AGREEMENTS, id);
        let mut f = Fields::new();
        f.insert("deleted".into(), true.into());
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(KIND, id.as_str());
        Ok(())
    }

    async fn decode_full(
        &self,
        id: &AgreementId,
        raw: Fields,
        path: &Path,
    ) -> Result<Agreement, RepoError> {
        let mut agreement = decode(id, &raw, path)?;
        self.ctx.cache.insert(KIND, id.as_str(), raw);
        for (key, party_raw) in self.ctx.client.read_all(&path.child("parties")).await? {
            let Ok(actor) = ActorId::parse(key) else { continue };
            let party_path = path.child("parties").child(actor.as_str());
            match decode_party(&party_raw, &party_path) {
                Ok(party) => {
                    agreement.parties.insert(actor, party);
                }
                Err(err) => tracing::warn!(id = %id, actor = %actor, %err, "skipping undecodable party"),
            }
        }
        Ok(agreement)
    }

    /// Fire-and-forget: resolve each party to its owning user's email
    /// and send. Failures are logged, never propagated.
    async fn notify_parties(&self, agreement: &Agreement, subject: &str) {
        for actor in agreement.parties.keys() {
            let Some(email) = self.party_email(actor).await else { continue };
            let body = format!(
                "Agreement {} in game {} is now {}.",
                agreement.id, agreement.game_ref, agreement.status.as_str()
            );
            if let Err(err) = self.notifier.send(&email, subject, &body).await {
                tracing::warn!(actor = %actor, %err, "agreement notification failed");
            }
        }
    }

    async fn party_email(&self, actor: &ActorId) -> Option<String> {
        let actor_path = Path::entity(collections::ACTORS, actor);
        let actor_raw = self.ctx.client.read(&actor_path).await.ok()??;
        let user_id = fields::opt_str(&actor_raw, "user_ref", &actor_path).ok()??;
        let user_id = UserId::parse(user_id).ok()?;
        let user_path = Path::entity(collections::USERS, &user_id);
        let user_raw = self.ctx.client.read(&user_path).await.ok()??;
        fields::opt_str(&user_raw, "email", &user_path).ok()?
    }
}

fn encode(agreement: &Agreement) -> Fields {
    let mut f = Fields::new();
    f.insert("game_ref".into(), agreement.game_ref.as_str().into());
    f.insert("status".into(), agreement.status.as_str().into());
    if agreement.deleted {
        f.insert("deleted".into(), true.into());
    }
    f.insert("created_at".into(), agreement.created_at.to_rfc3339().into());
    f.insert("updated_at".into(), agreement.updated_at.to_rfc3339().into());
    f
}

fn encode_party(party: &Party) -> Fields {
    let mut f = Fields::new();
    f.insert("card_ref".into(), party.card_ref.as_str().into());
    f.insert("obligation".into(), party.obligation.clone().into());
    f.insert("benefit".into(), party.benefit.clone().into());
    f
}

fn decode(id: &AgreementId, raw: &Fields, path: &Path) -> Result<Agreement, StoreError> {
    Ok(Agreement {
        id: id.clone(),
        game_ref: GameId::parse(fields::req_str(raw, "game_ref", path)?)
            .map_err(|e| StoreError::decode(path, e.to_string()))?,
        parties: BTreeMap::new(),
        status: AgreementStatus::parse(&fields::req_str(raw, "status", path)?)
            .map_err(|e| StoreError::decode(path, e.to_string()))?,
        deleted: fields::flag(raw, "deleted"),
        created_at: fields::req_datetime(raw, "created_at", path)?,
        updated_at: fields::req_datetime(raw, "updated_at", path)?,
    })
}

fn decode_party(raw: &Fields, path: &Path) -> Result<Party, StoreError> {
    Ok(Party {
        card_ref: CardId::parse(fields::req_str(raw, "card_ref", path)?)
            .map_err(|e| StoreError::decode(path, e.to_string()))?,
        obligation: fields::opt_str(raw, "obligation", path)?.unwrap_or_default(),
        benefit: fields::opt_str(raw, "benefit", path)?.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::identity::FixedIdentity;
    use crate::infrastructure::persistence::Repositories;
    use crate::infrastructure::ports::MockNotifierPort;
    use crate::infrastructure::store::MemoryPathStore;

    use super::*;

    /// Two repository handles over one store: the first mints the user
    /// so the second can act as that principal.
    async fn repos_as_new_user(notifier: Arc<dyn NotifierPort>) -> Repositories {
        let store = Arc::new(MemoryPathStore::new());
        let bootstrap = Repositories::new(
            store.clone(),
            Arc::new(SystemClock),
            Arc::new(FixedIdentity::anonymous()),
            notifier.clone(),
            &EngineConfig::default(),
        );
        let user = bootstrap
            .users
            .create("Sam", Some("sam@example.org"))
            .await
            .expect("user");
        Repositories::new(
            store,
            Arc::new(SystemClock),
            Arc::new(FixedIdentity::of(user.id)),
            notifier,
            &EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn creating_an_agreement_notifies_party_owners() {
        let mut notifier = MockNotifierPort::new();
        notifier
            .expect_send()
            .withf(|to, subject, _| to == "sam@example.org" && subject == "New agreement proposed")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let repos = repos_as_new_user(Arc::new(notifier)).await;
        let game = repos.games.create("Treaty", None).await.expect("game");
        // `owned` stamps the principal, linking the actor to the user.
        let actor = repos.actors.create("Smith", true).await.expect("actor");
        repos
            .games
            .add_actor(&game.id, &actor.id)
            .await
            .expect("register actor");
        let card = repos.cards.create("Forge", "", "craft").await.expect("card");

        let mut parties = BTreeMap::new();
        parties.insert(
            actor.id.clone(),
            Party {
                card_ref: card.id.clone(),
                obligation: "shoe the horses".into(),
                benefit: "grain each harvest".into(),
            },
        );
        repos
            .agreements
            .create(&game.id, parties)
            .await
            .expect("agreement");
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_write() {
        let mut notifier = MockNotifierPort::new();
        notifier
            .expect_send()
            .returning(|_, _, _| Err(crate::infrastructure::ports::NotifyError::SendFailed(
                "smtp down".into(),
            )));

        let repos = repos_as_new_user(Arc::new(notifier)).await;
        let game = repos.games.create("Treaty", None).await.expect("game");
        let actor = repos.actors.create("Smith", true).await.expect("actor");
        repos
            .games
            .add_actor(&game.id, &actor.id)
            .await
            .expect("register actor");
        let card = repos.cards.create("Forge", "", "craft").await.expect("card");

        let mut parties = BTreeMap::new();
        parties.insert(
            actor.id.clone(),
            Party {
                card_ref: card.id.clone(),
                obligation: "shoe the horses".into(),
                benefit: "".into(),
            },
        );
        let agreement = repos
            .agreements
            .create(&game.id, parties)
            .await
            .expect("write survives a failed notification");
        assert_eq!(agreement.status, AgreementStatus::Proposed);
    }
}
