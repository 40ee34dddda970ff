//! Chat entities - rooms and their messages.
//!
//! Messages are sharded into day-bucketed sub-collections under the
//! room's `messages_ref` map (`messages_ref/day_YYYYMMDD/<msg_id>`), so
//! reading a room never pulls its whole history in one read. A
//! message's `read_by_ref` boolean map is append-only.

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::ids::{ChatRoomId, GameId, MessageId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    /// Open to every player in the game.
    Group,
    /// Private member-pair room.
    Direct,
}

impl ChatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Direct => "direct",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "group" => Ok(Self::Group),
            "direct" => Ok(Self::Direct),
            other => Err(DomainError::validation(format!("unknown chat kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRoom {
    pub id: ChatRoomId,
    pub game_ref: GameId,
    pub kind: ChatKind,
    /// Display name; unnamed rooms render from their member list.
    pub name: Option<String>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatRoom {
    pub fn new(game: GameId, kind: ChatKind, now: DateTime<Utc>) -> Self {
        Self {
            id: ChatRoomId::new(),
            game_ref: game,
            kind,
            name: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub chat_ref: ChatRoomId,
    pub sender_ref: UserId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(
        chat: ChatRoomId,
        sender: UserId,
        body: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            chat_ref: chat,
            sender_ref: sender,
            body: body.into(),
            sent_at: now,
        }
    }

    /// Shard key for the day bucket this message lands in.
    pub fn day_bucket(&self) -> String {
        format!("day_{}", self.sent_at.format("%Y%m%d"))
    }
}
