//! Card repository.
//!
//! Card core attributes are immutable after create; only the
//! relationship maps change. The vocabulary edges (values,
//! capabilities) are logically bidirectional and stored as two
//! independent maps, so both sides are written here - far side first,
//! so a partial failure leaves an edge the reconciliation pass can see
//! from the vocabulary side.

use accord_domain::{AgreementId, CapabilityId, Card, CardId, DeckId, ValueId};

use crate::infrastructure::ports::{Fields, RepoError, StoreError};
use crate::infrastructure::store::{collections, fields, Path};

use super::RepoContext;

const KIND: &str = "Card";

pub struct CardRepository {
    ctx: RepoContext,
}

impl CardRepository {
    pub fn new(ctx: RepoContext) -> Self {
        Self { ctx }
    }

    pub async fn create(
        &self,
        name: &str,
        backstory: &str,
        category: &str,
    ) -> Result<Card, RepoError> {
        if name.trim().is_empty() {
            return Err(RepoError::validation("card name must not be empty"));
        }
        if category.trim().is_empty() {
            return Err(RepoError::validation("card category must not be empty"));
        }
        let card = Card::new(name, backstory, category, self.ctx.clock.now());
        let path = Path::entity(collections::CARDS, &card.id);
        if let Some(existing) = self.ctx.client.read(&path).await? {
            return Ok(decode(&card.id, &existing, &path)?);
        }
        self.ctx.client.write(&path, encode(&card)).await?;
        self.ctx.cache.invalidate(KIND, card.id.as_str());
        tracing::debug!(id = %card.id, "created card");
        Ok(card)
    }

    pub async fn get_by_id(&self, id: &CardId) -> Result<Card, RepoError> {
        let path = Path::entity(collections::CARDS, id);
        if let Some(cached) = self.ctx.cache.get(KIND, id.as_str()) {
            return Ok(decode(id, &cached, &path)?);
        }
        let raw = self
            .ctx
            .client
            .read(&path)
            .await?
            .ok_or_else(|| RepoError::not_found(KIND, id))?;
        let card = decode(id, &raw, &path)?;
        self.ctx.cache.insert(KIND, id.as_str(), raw);
        Ok(card)
    }

    pub async fn get_all(&self) -> Result<Vec<Card>, RepoError> {
        let root = Path::new(collections::CARDS);
        let mut cards = Vec::new();
        for (key, raw) in self.ctx.client.read_all(&root).await? {
            let Ok(id) = CardId::parse(key) else { continue };
            match decode(&id, &raw, &Path::entity(collections::CARDS, &id)) {
                Ok(card) if !card.deleted => cards.push(card),
                Ok(_) => {}
                Err(err) => tracing::warn!(id = %id, %err, "skipping undecodable card"),
            }
        }
        Ok(cards)
    }

    /// Link a value to this card, both directions.
    pub async fn add_value(&self, card: &CardId, value: &ValueId) -> Result<(), RepoError> {
        let card_path = Path::entity(collections::CARDS, card);
        let value_path = Path::entity(collections::VALUES, value);
        self.ctx
            .edges
            .add_edge(&value_path, "cards_ref", card.as_str())
            .await?;
        self.ctx
            .edges
            .add_edge(&card_path, "values_ref", value.as_str())
            .await?;
        Ok(())
    }

    /// Unlink a value, both directions. Reverse order of `add_value` so
    /// the card side disappears first.
    pub async fn remove_value(&self, card: &CardId, value: &ValueId) -> Result<(), RepoError> {
        let card_path = Path::entity(collections::CARDS, card);
        let value_path = Path::entity(collections::VALUES, value);
        self.ctx
            .edges
            .remove_edge(&card_path, "values_ref", value.as_str())
            .await?;
        self.ctx
            .edges
            .remove_edge(&value_path, "cards_ref", card.as_str())
            .await?;
        Ok(())
    }

    pub async fn add_capability(
        &self,
        card: &CardId,
        capability: &CapabilityId,
    ) -> Result<(), RepoError> {
        let card_path = Path::entity(collections::CARDS, card);
        let cap_path = Path::entity(collections::CAPABILITIES, capability);
        self.ctx
            .edges
            .add_edge(&cap_path, "cards_ref", card.as_str())
            .await?;
        self.ctx
            .edges
            .add_edge(&card_path, "caps_ref", capability.as_str())
            .await?;
        Ok(())
    }

    pub async fn remove_capability(
        &self,
        card: &CardId,
        capability: &CapabilityId,
    ) -> Result<(), RepoError> {
        let card_path = Path::entity(collections::CARDS, card);
        let cap_path = Path::entity(collections::CAPABILITIES, capability);
        self.ctx
            .edges
            .remove_edge(&card_path, "caps_ref", capability.as_str())
            .await?;
        self.ctx
            .edges
            .remove_edge(&cap_path, "cards_ref", card.as_str())
            .await?;
        Ok(())
    }

    pub async fn value_ids(&self, card: &CardId) -> Result<Vec<ValueId>, RepoError> {
        let path = Path::entity(collections::CARDS, card);
        let ids = self.ctx.edges.list_edges(&path, "values_ref").await?;
        Ok(ids.into_iter().filter_map(|id| ValueId::parse(id).ok()).collect())
    }

    pub async fn capability_ids(&self, card: &CardId) -> Result<Vec<CapabilityId>, RepoError> {
        let path = Path::entity(collections::CARDS, card);
        let ids = self.ctx.edges.list_edges(&path, "caps_ref").await?;
        Ok(ids
            .into_iter()
            .filter_map(|id| CapabilityId::parse(id).ok())
            .collect())
    }

    pub async fn agreement_ids(&self, card: &CardId) -> Result<Vec<AgreementId>, RepoError> {
        let path = Path::entity(collections::CARDS, card);
        let ids = self.ctx.edges.list_edges(&path, "agreements_ref").await?;
        Ok(ids
            .into_iter()
            .filter_map(|id| AgreementId::parse(id).ok())
            .collect())
    }

    pub async fn deck_ids(&self, card: &CardId) -> Result<Vec<DeckId>, RepoError> {
        let path = Path::entity(collections::CARDS, card);
        let ids = self.ctx.edges.list_edges(&path, "decks_ref").await?;
        Ok(ids.into_iter().filter_map(|id| DeckId::parse(id).ok()).collect())
    }

    pub async fn soft_delete(&self, id: &CardId) -> Result<(), RepoError> {
        let path = Path::entity(collections::CARDS, id);
        let mut f = Fields::new();
        f.insert("deleted".into(), true.into());
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(KIND, id.as_str());
        tracing::debug!(id = %id, "soft-deleted card");
        Ok(())
    }
}

fn encode(card: &Card) -> Fields {
    let mut f = Fields::new();
    f.insert("name".into(), card.name.clone().into());
    f.insert("backstory".into(), card.backstory.clone().into());
    f.insert("category".into(), card.category.clone().into());
    if card.deleted {
        f.insert("deleted".into(), true.into());
    }
    f.insert("created_at".into(), card.created_at.to_rfc3339().into());
    f.insert("updated_at".into(), card.updated_at.to_rfc3339().into());
    f
}

fn decode(id: &CardId, raw: &Fields, path: &Path) -> Result<Card, StoreError> {
    Ok(Card {
        id: id.clone(),
        name: fields::req_str(raw, "name", path)?,
        backstory: fields::opt_str(raw, "backstory", path)?.unwrap_or_default(),
        category: fields::req_str(raw, "category", path)?,
        deleted: fields::flag(raw, "deleted"),
        created_at: fields::req_datetime(raw, "created_at", path)?,
        updated_at: fields::req_datetime(raw, "updated_at", path)?,
    })
}
