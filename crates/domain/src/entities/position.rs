//! Position - an ephemeral 2-D coordinate for one node on a game board.
//!
//! The node may be a card, agreement or actor; `node_id` keeps the raw
//! prefixed id so any of them fits. Last write wins; the visualization
//! layer that consumes these tolerates staleness.

use chrono::{DateTime, Utc};

use crate::ids::GameId;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub game_ref: GameId,
    pub node_id: String,
    pub x: f64,
    pub y: f64,
    pub updated_at: DateTime<Utc>,
}
