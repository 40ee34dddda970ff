//! Position repository.
//!
//! Positions are ephemeral last-write-wins coordinates keyed by
//! `positions/<game>/<node>`. They are deliberately uncached: the write
//! rate dwarfs the read rate and staleness is harmless, so the cache
//! would only churn.

use accord_domain::{GameId, Position};

use crate::infrastructure::ports::{ChangeCallback, Fields, RepoError, StoreError};
use crate::infrastructure::store::{collections, fields, Path, Subscription};

use super::RepoContext;

pub struct PositionRepository {
    ctx: RepoContext,
}

impl PositionRepository {
    pub fn new(ctx: RepoContext) -> Self {
        Self { ctx }
    }

    pub async fn set(
        &self,
        game: &GameId,
        node_id: &str,
        x: f64,
        y: f64,
    ) -> Result<(), RepoError> {
        if node_id.is_empty() {
            return Err(RepoError::validation("position node id must not be empty"));
        }
        let path = Path::new(collections::POSITIONS)
            .child(game.as_str())
            .child(node_id);
        let mut f = Fields::new();
        f.insert("x".into(), serde_json::json!(x));
        f.insert("y".into(), serde_json::json!(y));
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        tracing::debug!(game = %game, node_id, x, y, "position written");
        Ok(())
    }

    pub async fn get(&self, game: &GameId, node_id: &str) -> Result<Option<Position>, RepoError> {
        let path = Path::new(collections::POSITIONS)
            .child(game.as_str())
            .child(node_id);
        match self.ctx.client.read(&path).await? {
            Some(raw) => Ok(Some(decode(game, node_id, &raw, &path)?)),
            None => Ok(None),
        }
    }

    /// Live updates for one node's position. The callback fires with
    /// the changed fields on every write; dropping the returned guard
    /// cancels the subscription.
    pub async fn watch(
        &self,
        game: &GameId,
        node_id: &str,
        callback: ChangeCallback,
    ) -> Result<Subscription, RepoError> {
        let path = Path::new(collections::POSITIONS)
            .child(game.as_str())
            .child(node_id);
        Ok(self.ctx.client.subscribe(&path, callback).await?)
    }

    /// Every positioned node of the game.
    pub async fn list_for_game(&self, game: &GameId) -> Result<Vec<Position>, RepoError> {
        let root = Path::new(collections::POSITIONS).child(game.as_str());
        let mut positions = Vec::new();
        for (node_id, raw) in self.ctx.client.read_all(&root).await? {
            let path = root.child(&node_id);
            match decode(game, &node_id, &raw, &path) {
                Ok(position) => positions.push(position),
                Err(err) => tracing::warn!(game = %game, node_id, %err, "skipping undecodable position"),
            }
        }
        Ok(positions)
    }
}

fn decode(game: &GameId, node_id: &str, raw: &Fields, path: &Path) -> Result<Position, StoreError> {
    Ok(Position {
        game_ref: game.clone(),
        node_id: node_id.to_string(),
        x: fields::req_f64(raw, "x", path)?,
        y: fields::req_f64(raw, "y", path)?,
        updated_at: fields::req_datetime(raw, "updated_at", path)?,
    })
}
