//! Vocabulary repository: Values and Capabilities.
//!
//! Both types carry slug-derived deterministic ids, which is what makes
//! `create` idempotent: creating "Mutual Aid" twice hits the same path
//! and returns the existing record.

use accord_domain::{slugify, Capability, CapabilityId, CardId, Value, ValueId};

use crate::infrastructure::ports::{Fields, RepoError, StoreError};
use crate::infrastructure::store::{collections, fields, Path};

use super::RepoContext;

const VALUE_KIND: &str = "Value";
const CAPABILITY_KIND: &str = "Capability";

pub struct VocabRepository {
    ctx: RepoContext,
}

impl VocabRepository {
    pub fn new(ctx: RepoContext) -> Self {
        Self { ctx }
    }

    // -------------------------------------------------------------
    // Values
    // -------------------------------------------------------------

    pub async fn create_value(&self, name: &str) -> Result<Value, RepoError> {
        if slugify(name).is_empty() {
            return Err(RepoError::validation(
                "value name must contain at least one alphanumeric character",
            ));
        }
        let value = Value::new(name.trim(), self.ctx.clock.now());
        let path = Path::entity(collections::VALUES, &value.id);
        if let Some(existing) = self.ctx.client.read(&path).await? {
            return Ok(decode_value(&value.id, &existing, &path)?);
        }
        self.ctx.client.write(&path, encode_named(&value.name, value.created_at)).await?;
        self.ctx.cache.invalidate(VALUE_KIND, value.id.as_str());
        tracing::debug!(id = %value.id, "created value");
        Ok(value)
    }

    pub async fn get_value(&self, id: &ValueId) -> Result<Value, RepoError> {
        let path = Path::entity(collections::VALUES, id);
        if let Some(cached) = self.ctx.cache.get(VALUE_KIND, id.as_str()) {
            return Ok(decode_value(id, &cached, &path)?);
        }
        let raw = self
            .ctx
            .client
            .read(&path)
            .await?
            .ok_or_else(|| RepoError::not_found(VALUE_KIND, id))?;
        let value = decode_value(id, &raw, &path)?;
        self.ctx.cache.insert(VALUE_KIND, id.as_str(), raw);
        Ok(value)
    }

    pub async fn get_all_values(&self) -> Result<Vec<Value>, RepoError> {
        let root = Path::new(collections::VALUES);
        let mut values = Vec::new();
        for (key, raw) in self.ctx.client.read_all(&root).await? {
            let Ok(id) = ValueId::parse(key) else { continue };
            match decode_value(&id, &raw, &Path::entity(collections::VALUES, &id)) {
                Ok(value) if !value.deleted => values.push(value),
                Ok(_) => {}
                Err(err) => tracing::warn!(id = %id, %err, "skipping undecodable value"),
            }
        }
        Ok(values)
    }

    /// Rename the display name. The slug id is fixed at create, so
    /// existing card edges keep pointing at the same record.
    pub async fn update_value(&self, id: &ValueId, name: &str) -> Result<(), RepoError> {
        self.rename(Path::entity(collections::VALUES, id), VALUE_KIND, id.as_str(), name)
            .await
    }

    pub async fn soft_delete_value(&self, id: &ValueId) -> Result<(), RepoError> {
        self.tombstone(Path::entity(collections::VALUES, id), VALUE_KIND, id.as_str())
            .await
    }

    /// Cards that carry this value (reverse side of the symmetric edge).
    pub async fn value_card_ids(&self, id: &ValueId) -> Result<Vec<CardId>, RepoError> {
        let path = Path::entity(collections::VALUES, id);
        let ids = self.ctx.edges.list_edges(&path, "cards_ref").await?;
        Ok(ids.into_iter().filter_map(|id| CardId::parse(id).ok()).collect())
    }

    // -------------------------------------------------------------
    // Capabilities
    // -------------------------------------------------------------

    pub async fn create_capability(&self, name: &str) -> Result<Capability, RepoError> {
        if slugify(name).is_empty() {
            return Err(RepoError::validation(
                "capability name must contain at least one alphanumeric character",
            ));
        }
        let cap = Capability::new(name.trim(), self.ctx.clock.now());
        let path = Path::entity(collections::CAPABILITIES, &cap.id);
        if let Some(existing) = self.ctx.client.read(&path).await? {
            return Ok(decode_capability(&cap.id, &existing, &path)?);
        }
        self.ctx.client.write(&path, encode_named(&cap.name, cap.created_at)).await?;
        self.ctx.cache.invalidate(CAPABILITY_KIND, cap.id.as_str());
        tracing::debug!(id = %cap.id, "created capability");
        Ok(cap)
    }

    pub async fn get_capability(&self, id: &CapabilityId) -> Result<Capability, RepoError> {
        let path = Path::entity(collections::CAPABILITIES, id);
        if let Some(cached) = self.ctx.cache.get(CAPABILITY_KIND, id.as_str()) {
            return Ok(decode_capability(id, &cached, &path)?);
        }
        let raw = self
            .ctx
            .client
            .read(&path)
            .await?
            .ok_or_else(|| RepoError::not_found(CAPABILITY_KIND, id))?;
        let cap = decode_capability(id, &raw, &path)?;
        self.ctx.cache.insert(CAPABILITY_KIND, id.as_str(), raw);
        Ok(cap)
    }

    pub async fn get_all_capabilities(&self) -> Result<Vec<Capability>, RepoError> {
        let root = Path::new(collections::CAPABILITIES);
        let mut caps = Vec::new();
        for (key, raw) in self.ctx.client.read_all(&root).await? {
            let Ok(id) = CapabilityId::parse(key) else { continue };
            match decode_capability(&id, &raw, &Path::entity(collections::CAPABILITIES, &id)) {
                Ok(cap) if !cap.deleted => caps.push(cap),
                Ok(_) => {}
                Err(err) => tracing::warn!(id = %id, %err, "skipping undecodable capability"),
            }
        }
        Ok(caps)
    }

    pub async fn update_capability(&self, id: &CapabilityId, name: &str) -> Result<(), RepoError> {
        self.rename(
            Path::entity(collections::CAPABILITIES, id),
            CAPABILITY_KIND,
            id.as_str(),
            name,
        )
        .await
    }

    pub async fn soft_delete_capability(&self, id: &CapabilityId) -> Result<(), RepoError> {
        self.tombstone(
            Path::entity(collections::CAPABILITIES, id),
            CAPABILITY_KIND,
            id.as_str(),
        )
        .await
    }

    pub async fn capability_card_ids(&self, id: &CapabilityId) -> Result<Vec<CardId>, RepoError> {
        let path = Path::entity(collections::CAPABILITIES, id);
        let ids = self.ctx.edges.list_edges(&path, "cards_ref").await?;
        Ok(ids.into_iter().filter_map(|id| CardId::parse(id).ok()).collect())
    }

    async fn rename(
        &self,
        path: Path,
        kind: &'static str,
        id: &str,
        name: &str,
    ) -> Result<(), RepoError> {
        if name.trim().is_empty() {
            return Err(RepoError::validation("name must not be empty"));
        }
        let mut f = Fields::new();
        f.insert("name".into(), name.trim().into());
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(kind, id);
        Ok(())
    }

    /// The record stays so card edges keep resolving; listings skip it.
    async fn tombstone(&self, path: Path, kind: &'static str, id: &str) -> Result<(), RepoError> {
        let mut f = Fields::new();
        f.insert("deleted".into(), true.into());
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(kind, id);
        tracing::debug!(%id, "soft-deleted vocabulary entry");
        Ok(())
    }
}

fn encode_named(name: &str, created_at: chrono::DateTime<chrono::Utc>) -> Fields {
    let mut f = Fields::new();
    f.insert("name".into(), name.into());
    f.insert("created_at".into(), created_at.to_rfc3339().into());
    f.insert("updated_at".into(), created_at.to_rfc3339().into());
    f
}

fn decode_value(id: &ValueId, raw: &Fields, path: &Path) -> Result<Value, StoreError> {
    Ok(Value {
        id: id.clone(),
        name: fields::req_str(raw, "name", path)?,
        deleted: fields::flag(raw, "deleted"),
        created_at: fields::req_datetime(raw, "created_at", path)?,
        updated_at: fields::req_datetime(raw, "updated_at", path)?,
    })
}

fn decode_capability(
    id: &CapabilityId,
    raw: &Fields,
    path: &Path,
) -> Result<Capability, StoreError> {
    Ok(Capability {
        id: id.clone(),
        name: fields::req_str(raw, "name", path)?,
        deleted: fields::flag(raw, "deleted"),
        created_at: fields::req_datetime(raw, "created_at", path)?,
        updated_at: fields::req_datetime(raw, "updated_at", path)?,
    })
}
