//! User repository.

use accord_domain::{User, UserId, UserRole};

use crate::infrastructure::ports::{Fields, RepoError, StoreError};
use crate::infrastructure::store::{collections, fields, Path};

use super::RepoContext;

const KIND: &str = "User";

/// Partial update; unset fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub public_key: Option<String>,
    pub role: Option<UserRole>,
}

pub struct UserRepository {
    ctx: RepoContext,
}

impl UserRepository {
    pub fn new(ctx: RepoContext) -> Self {
        Self { ctx }
    }

    /// Mint a new user. Timestamps come from the repository clock, never
    /// the caller; public key and role changes go through `update`.
    pub async fn create(&self, name: &str, email: Option<&str>) -> Result<User, RepoError> {
        if name.trim().is_empty() {
            return Err(RepoError::validation("user name must not be empty"));
        }
        let mut user = User::new(name, self.ctx.clock.now());
        if let Some(email) = email {
            user = user.with_email(email);
        }
        let path = Path::entity(collections::USERS, &user.id);
        // Duplicate check keeps create idempotent under retries.
        if let Some(existing) = self.ctx.client.read(&path).await? {
            return Ok(decode(&user.id, &existing, &path)?);
        }
        self.ctx.client.write(&path, encode(&user)).await?;
        self.ctx.cache.invalidate(KIND, user.id.as_str());
        tracing::debug!(id = %user.id, "created user");
        Ok(user)
    }

    pub async fn get_by_id(&self, id: &UserId) -> Result<User, RepoError> {
        let path = Path::entity(collections::USERS, id);
        if let Some(cached) = self.ctx.cache.get(KIND, id.as_str()) {
            return Ok(decode(id, &cached, &path)?);
        }
        let raw = self
            .ctx
            .client
            .read(&path)
            .await?
            .ok_or_else(|| RepoError::not_found(KIND, id))?;
        let user = decode(id, &raw, &path)?;
        self.ctx.cache.insert(KIND, id.as_str(), raw);
        Ok(user)
    }

    /// Bounded full-collection scan. Soft-deleted users are skipped;
    /// undecodable nodes are logged and skipped.
    pub async fn get_all(&self) -> Result<Vec<User>, RepoError> {
        let root = Path::new(collections::USERS);
        let mut users = Vec::new();
        for (key, raw) in self.ctx.client.read_all(&root).await? {
            let Ok(id) = UserId::parse(key) else { continue };
            match decode(&id, &raw, &Path::entity(collections::USERS, &id)) {
                Ok(user) if !user.deleted => users.push(user),
                Ok(_) => {}
                Err(err) => tracing::warn!(id = %id, %err, "skipping undecodable user"),
            }
        }
        Ok(users)
    }

    pub async fn update(&self, id: &UserId, update: UserUpdate) -> Result<(), RepoError> {
        if matches!(&update.name, Some(n) if n.trim().is_empty()) {
            return Err(RepoError::validation("user name must not be empty"));
        }
        let path = Path::entity(collections::USERS, id);
        let mut fields = Fields::new();
        if let Some(name) = update.name {
            fields.insert("name".into(), name.into());
        }
        if let Some(email) = update.email {
            fields.insert("email".into(), email.into());
        }
        if let Some(key) = update.public_key {
            fields.insert("public_key".into(), key.into());
        }
        if let Some(role) = update.role {
            fields.insert("role".into(), role.as_str().into());
        }
        fields.insert(
            "updated_at".into(),
            self.ctx.clock.now().to_rfc3339().into(),
        );
        self.ctx.client.write(&path, fields).await?;
        self.ctx.cache.invalidate(KIND, id.as_str());
        Ok(())
    }

    /// Null the personal fields and flip the tombstone flag. The record
    /// itself stays so referencing ids keep resolving.
    pub async fn soft_delete(&self, id: &UserId) -> Result<(), RepoError> {
        let path = Path::entity(collections::USERS, id);
        self.ctx.client.tombstone(&path, ["email", "public_key"]).await?;
        let mut fields = Fields::new();
        fields.insert("deleted".into(), true.into());
        fields.insert(
            "updated_at".into(),
            self.ctx.clock.now().to_rfc3339().into(),
        );
        self.ctx.client.write(&path, fields).await?;
        self.ctx.cache.invalidate(KIND, id.as_str());
        tracing::debug!(id = %id, "soft-deleted user");
        Ok(())
    }
}

fn encode(user: &User) -> Fields {
    let mut f = Fields::new();
    f.insert("name".into(), user.name.clone().into());
    if let Some(email) = &user.email {
        f.insert("email".into(), email.clone().into());
    }
    if let Some(key) = &user.public_key {
        f.insert("public_key".into(), key.clone().into());
    }
    f.insert("role".into(), user.role.as_str().into());
    if user.deleted {
        f.insert("deleted".into(), true.into());
    }
    f.insert("created_at".into(), user.created_at.to_rfc3339().into());
    f.insert("updated_at".into(), user.updated_at.to_rfc3339().into());
    f
}

fn decode(id: &UserId, raw: &Fields, path: &Path) -> Result<User, StoreError> {
    Ok(User {
        id: id.clone(),
        name: fields::opt_str(raw, "name", path)?.unwrap_or_default(),
        email: fields::opt_str(raw, "email", path)?,
        public_key: fields::opt_str(raw, "public_key", path)?,
        role: UserRole::parse(&fields::req_str(raw, "role", path)?)
            .map_err(|e| StoreError::decode(path, e.to_string()))?,
        deleted: fields::flag(raw, "deleted"),
        created_at: fields::req_datetime(raw, "created_at", path)?,
        updated_at: fields::req_datetime(raw, "updated_at", path)?,
    })
}
