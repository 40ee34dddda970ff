//! Deck repository.
//!
//! Deck membership is the one boolean map expected to grow past the
//! per-read comfort zone, so it is always written sharded: entries land
//! in `cards_ref/page_<n>`, where `n` advances every `shard_threshold`
//! additions. `cards_count` on the deck entity is the append cursor
//! deciding the current page; it is not decremented on removal, so a
//! page is never reused once passed.

use accord_domain::{CardId, Deck, DeckId};

use crate::infrastructure::ports::{Fields, RepoError, StoreError};
use crate::infrastructure::store::{collections, fields, Path};

use super::RepoContext;

const KIND: &str = "Deck";

/// Partial update; unset fields are left untouched. `cards_count` is
/// the append cursor and only moves through `add_card`.
#[derive(Debug, Default, Clone)]
pub struct DeckUpdate {
    pub name: Option<String>,
}

pub struct DeckRepository {
    ctx: RepoContext,
    shard_threshold: u64,
}

impl DeckRepository {
    pub fn new(ctx: RepoContext, shard_threshold: u64) -> Self {
        Self {
            ctx,
            shard_threshold: shard_threshold.max(1),
        }
    }

    pub async fn create(&self, name: &str) -> Result<Deck, RepoError> {
        if name.trim().is_empty() {
            return Err(RepoError::validation("deck name must not be empty"));
        }
        let deck = Deck::new(name, self.ctx.clock.now());
        let path = Path::entity(collections::DECKS, &deck.id);
        if let Some(existing) = self.ctx.client.read(&path).await? {
            return Ok(decode(&deck.id, &existing, &path)?);
        }
        self.ctx.client.write(&path, encode(&deck)).await?;
        self.ctx.cache.invalidate(KIND, deck.id.as_str());
        tracing::debug!(id = %deck.id, "created deck");
        Ok(deck)
    }

    pub async fn get_by_id(&self, id: &DeckId) -> Result<Deck, RepoError> {
        let path = Path::entity(collections::DECKS, id);
        if let Some(cached) = self.ctx.cache.get(KIND, id.as_str()) {
            return Ok(decode(id, &cached, &path)?);
        }
        let raw = self
            .ctx
            .client
            .read(&path)
            .await?
            .ok_or_else(|| RepoError::not_found(KIND, id))?;
        let deck = decode(id, &raw, &path)?;
        self.ctx.cache.insert(KIND, id.as_str(), raw);
        Ok(deck)
    }

    pub async fn get_all(&self) -> Result<Vec<Deck>, RepoError> {
        let root = Path::new(collections::DECKS);
        let mut decks = Vec::new();
        for (key, raw) in self.ctx.client.read_all(&root).await? {
            let Ok(id) = DeckId::parse(key) else { continue };
            match decode(&id, &raw, &Path::entity(collections::DECKS, &id)) {
                Ok(deck) if !deck.deleted => decks.push(deck),
                Ok(_) => {}
                Err(err) => tracing::warn!(id = %id, %err, "skipping undecodable deck"),
            }
        }
        Ok(decks)
    }

    pub async fn update(&self, id: &DeckId, update: DeckUpdate) -> Result<(), RepoError> {
        if matches!(&update.name, Some(n) if n.trim().is_empty()) {
            return Err(RepoError::validation("deck name must not be empty"));
        }
        let path = Path::entity(collections::DECKS, id);
        let mut f = Fields::new();
        if let Some(name) = update.name {
            f.insert("name".into(), name.into());
        }
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(KIND, id.as_str());
        Ok(())
    }

    /// Add a card to the deck, both directions. The deck side goes into
    /// the page shard the append cursor selects.
    pub async fn add_card(&self, deck: &DeckId, card: &CardId) -> Result<(), RepoError> {
        let current = self.get_by_id(deck).await?;
        let page = current.cards_count / self.shard_threshold;
        let shard = format!("page_{page}");

        let deck_path = Path::entity(collections::DECKS, deck);
        let card_path = Path::entity(collections::CARDS, card);
        self.ctx
            .edges
            .add_edge(&card_path, "decks_ref", deck.as_str())
            .await?;
        self.ctx
            .edges
            .add_edge_in_shard(&deck_path, "cards_ref", &shard, card.as_str())
            .await?;

        let mut f = Fields::new();
        f.insert("cards_count".into(), (current.cards_count + 1).into());
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&deck_path, f).await?;
        self.ctx.cache.invalidate(KIND, deck.as_str());
        Ok(())
    }

    /// Remove a card from the deck, both directions. The append cursor
    /// stays where it is.
    pub async fn remove_card(&self, deck: &DeckId, card: &CardId) -> Result<(), RepoError> {
        let deck_path = Path::entity(collections::DECKS, deck);
        let card_path = Path::entity(collections::CARDS, card);
        self.ctx
            .edges
            .remove_edge(&deck_path, "cards_ref", card.as_str())
            .await?;
        self.ctx
            .edges
            .remove_edge(&card_path, "decks_ref", deck.as_str())
            .await?;
        Ok(())
    }

    /// All card ids in the deck, merged across every page shard.
    pub async fn card_ids(&self, deck: &DeckId) -> Result<Vec<CardId>, RepoError> {
        let path = Path::entity(collections::DECKS, deck);
        let ids = self.ctx.edges.list_edges(&path, "cards_ref").await?;
        Ok(ids.into_iter().filter_map(|id| CardId::parse(id).ok()).collect())
    }

    pub async fn soft_delete(&self, id: &DeckId) -> Result<(), RepoError> {
        let path = Path::entity(collections::DECKS, id);
        let mut f = Fields::new();
        f.insert("deleted".into(), true.into());
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(KIND, id.as_str());
        tracing::debug!(id = %id, "soft-deleted deck");
        Ok(())
    }
}

fn encode(deck: &Deck) -> Fields {
    let mut f = Fields::new();
    f.insert("name".into(), deck.name.clone().into());
    f.insert("cards_count".into(), deck.cards_count.into());
    if deck.deleted {
        f.insert("deleted".into(), true.into());
    }
    f.insert("created_at".into(), deck.created_at.to_rfc3339().into());
    f.insert("updated_at".into(), deck.updated_at.to_rfc3339().into());
    f
}

fn decode(id: &DeckId, raw: &Fields, path: &Path) -> Result<Deck, StoreError> {
    Ok(Deck {
        id: id.clone(),
        name: fields::req_str(raw, "name", path)?,
        cards_count: fields::opt_u64(raw, "cards_count", path)?.unwrap_or(0),
        deleted: fields::flag(raw, "deleted"),
        created_at: fields::req_datetime(raw, "created_at", path)?,
        updated_at: fields::req_datetime(raw, "updated_at", path)?,
    })
}
