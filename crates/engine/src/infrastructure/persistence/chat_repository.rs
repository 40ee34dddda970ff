//! Chat repository: rooms and messages.
//!
//! Message entities live in their own collection; the room only holds
//! a day-bucketed shard map (`messages_ref/day_YYYYMMDD`) referencing
//! them, so reading a room's recent traffic never scans its whole
//! history. `read_by_ref` on a message is append-only: receipts are
//! added, never tombstoned.

use futures_util::future::join_all;

use accord_domain::{ChatKind, ChatMessage, ChatRoom, ChatRoomId, GameId, MessageId, UserId};

use crate::infrastructure::ports::{Fields, RepoError, StoreError};
use crate::infrastructure::store::{collections, fields, Path};

use super::RepoContext;

const ROOM_KIND: &str = "ChatRoom";
const MESSAGE_KIND: &str = "ChatMessage";

/// Partial room update; unset fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct ChatRoomUpdate {
    pub name: Option<String>,
}

pub struct ChatRepository {
    ctx: RepoContext,
}

impl ChatRepository {
    pub fn new(ctx: RepoContext) -> Self {
        Self { ctx }
    }

    pub async fn create_room(
        &self,
        game: &GameId,
        kind: ChatKind,
        members: &[UserId],
    ) -> Result<ChatRoom, RepoError> {
        if members.is_empty() {
            return Err(RepoError::validation("a chat room needs at least one member"));
        }
        if kind == ChatKind::Direct && members.len() != 2 {
            return Err(RepoError::validation("a direct room has exactly two members"));
        }
        let room = ChatRoom::new(game.clone(), kind, self.ctx.clock.now());
        let path = Path::entity(collections::CHATS, &room.id);
        if let Some(existing) = self.ctx.client.read(&path).await? {
            return Ok(decode_room(&room.id, &existing, &path)?);
        }

        // Game-side membership first, then the room's own member map,
        // then the entity.
        let game_path = Path::entity(collections::GAMES, game);
        self.ctx
            .edges
            .add_edge(&game_path, "chats_ref", room.id.as_str())
            .await?;
        for member in members {
            self.ctx
                .edges
                .add_edge(&path, "members_ref", member.as_str())
                .await?;
        }
        self.ctx.client.write(&path, encode_room(&room)).await?;
        self.ctx.cache.invalidate(ROOM_KIND, room.id.as_str());
        tracing::debug!(id = %room.id, game = %game, kind = kind.as_str(), "created chat room");
        Ok(room)
    }

    pub async fn get_room(&self, id: &ChatRoomId) -> Result<ChatRoom, RepoError> {
        let path = Path::entity(collections::CHATS, id);
        if let Some(cached) = self.ctx.cache.get(ROOM_KIND, id.as_str()) {
            return Ok(decode_room(id, &cached, &path)?);
        }
        let raw = self
            .ctx
            .client
            .read(&path)
            .await?
            .ok_or_else(|| RepoError::not_found(ROOM_KIND, id))?;
        let room = decode_room(id, &raw, &path)?;
        self.ctx.cache.insert(ROOM_KIND, id.as_str(), raw);
        Ok(room)
    }

    pub async fn get_all_rooms(&self) -> Result<Vec<ChatRoom>, RepoError> {
        let root = Path::new(collections::CHATS);
        let mut rooms = Vec::new();
        for (key, raw) in self.ctx.client.read_all(&root).await? {
            let Ok(id) = ChatRoomId::parse(key) else { continue };
            match decode_room(&id, &raw, &Path::entity(collections::CHATS, &id)) {
                Ok(room) if !room.deleted => rooms.push(room),
                Ok(_) => {}
                Err(err) => tracing::warn!(id = %id, %err, "skipping undecodable chat room"),
            }
        }
        Ok(rooms)
    }

    pub async fn update_room(
        &self,
        id: &ChatRoomId,
        update: ChatRoomUpdate,
    ) -> Result<(), RepoError> {
        if matches!(&update.name, Some(n) if n.trim().is_empty()) {
            return Err(RepoError::validation("chat room name must not be empty"));
        }
        let path = Path::entity(collections::CHATS, id);
        let mut f = Fields::new();
        if let Some(name) = update.name {
            f.insert("name".into(), name.into());
        }
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(ROOM_KIND, id.as_str());
        Ok(())
    }

    /// Messages and the game-side edge stay; listings skip the room.
    pub async fn soft_delete_room(&self, id: &ChatRoomId) -> Result<(), RepoError> {
        let path = Path::entity(collections::CHATS, id);
        let mut f = Fields::new();
        f.insert("deleted".into(), true.into());
        f.insert("updated_at".into(), self.ctx.clock.now().to_rfc3339().into());
        self.ctx.client.write(&path, f).await?;
        self.ctx.cache.invalidate(ROOM_KIND, id.as_str());
        tracing::debug!(id = %id, "soft-deleted chat room");
        Ok(())
    }

    pub async fn members(&self, id: &ChatRoomId) -> Result<Vec<UserId>, RepoError> {
        let path = Path::entity(collections::CHATS, id);
        let ids = self.ctx.edges.list_edges(&path, "members_ref").await?;
        Ok(ids.into_iter().filter_map(|id| UserId::parse(id).ok()).collect())
    }

    /// Post a message. The room must resolve first: a message with a
    /// dangling `chat_ref` would be unreachable garbage.
    pub async fn post_message(
        &self,
        chat: &ChatRoomId,
        sender: &UserId,
        body: &str,
    ) -> Result<ChatMessage, RepoError> {
        if body.trim().is_empty() {
            return Err(RepoError::validation("message body must not be empty"));
        }
        self.get_room(chat).await?;

        let message = ChatMessage::new(chat.clone(), sender.clone(), body, self.ctx.clock.now());
        let msg_path = Path::entity(collections::MESSAGES, &message.id);
        self.ctx.client.write(&msg_path, encode_message(&message)).await?;

        let room_path = Path::entity(collections::CHATS, chat);
        self.ctx
            .edges
            .add_edge_in_shard(
                &room_path,
                "messages_ref",
                &message.day_bucket(),
                message.id.as_str(),
            )
            .await?;
        tracing::debug!(id = %message.id, chat = %chat, "posted message");
        Ok(message)
    }

    pub async fn get_message(&self, id: &MessageId) -> Result<ChatMessage, RepoError> {
        let path = Path::entity(collections::MESSAGES, id);
        let raw = self
            .ctx
            .client
            .read(&path)
            .await?
            .ok_or_else(|| RepoError::not_found(MESSAGE_KIND, id))?;
        Ok(decode_message(id, &raw, &path)?)
    }

    /// All messages of the room across every day bucket, ordered by
    /// send time. Dangling references are logged and skipped.
    pub async fn list_messages(&self, chat: &ChatRoomId) -> Result<Vec<ChatMessage>, RepoError> {
        let room_path = Path::entity(collections::CHATS, chat);
        let ids = self.ctx.edges.list_edges(&room_path, "messages_ref").await?;

        let reads = ids
            .into_iter()
            .filter_map(|id| MessageId::parse(id).ok())
            .map(|id| async move { (id.clone(), self.get_message(&id).await) });
        let mut messages = Vec::new();
        for (id, result) in join_all(reads).await {
            match result {
                Ok(message) => messages.push(message),
                Err(err) if err.is_not_found() => {
                    tracing::warn!(id = %id, chat = %chat, "message reference does not resolve");
                }
                Err(err) => return Err(err),
            }
        }
        messages.sort_by_key(|m| m.sent_at);
        Ok(messages)
    }

    /// Append a read receipt. Append-only by contract; there is no
    /// unread operation.
    pub async fn mark_read(&self, message: &MessageId, user: &UserId) -> Result<(), RepoError> {
        let path = Path::entity(collections::MESSAGES, message);
        self.ctx
            .edges
            .add_edge(&path, "read_by_ref", user.as_str())
            .await?;
        Ok(())
    }

    pub async fn read_by(&self, message: &MessageId) -> Result<Vec<UserId>, RepoError> {
        let path = Path::entity(collections::MESSAGES, message);
        let ids = self.ctx.edges.list_edges(&path, "read_by_ref").await?;
        Ok(ids.into_iter().filter_map(|id| UserId::parse(id).ok()).collect())
    }
}

fn encode_room(room: &ChatRoom) -> Fields {
    let mut f = Fields::new();
    f.insert("game_ref".into(), room.game_ref.as_str().into());
    f.insert("kind".into(), room.kind.as_str().into());
    if let Some(name) = &room.name {
        f.insert("name".into(), name.clone().into());
    }
    if room.deleted {
        f.insert("deleted".into(), true.into());
    }
    f.insert("created_at".into(), room.created_at.to_rfc3339().into());
    f.insert("updated_at".into(), room.updated_at.to_rfc3339().into());
    f
}

fn decode_room(id: &ChatRoomId, raw: &Fields, path: &Path) -> Result<ChatRoom, StoreError> {
    Ok(ChatRoom {
        id: id.clone(),
        game_ref: GameId::parse(fields::req_str(raw, "game_ref", path)?)
            .map_err(|e| StoreError::decode(path, e.to_string()))?,
        kind: ChatKind::parse(&fields::req_str(raw, "kind", path)?)
            .map_err(|e| StoreError::decode(path, e.to_string()))?,
        name: fields::opt_str(raw, "name", path)?,
        deleted: fields::flag(raw, "deleted"),
        created_at: fields::req_datetime(raw, "created_at", path)?,
        updated_at: fields::req_datetime(raw, "updated_at", path)?,
    })
}

fn encode_message(message: &ChatMessage) -> Fields {
    let mut f = Fields::new();
    f.insert("chat_ref".into(), message.chat_ref.as_str().into());
    f.insert("sender_ref".into(), message.sender_ref.as_str().into());
    f.insert("body".into(), message.body.clone().into());
    f.insert("sent_at".into(), message.sent_at.to_rfc3339().into());
    f
}

fn decode_message(id: &MessageId, raw: &Fields, path: &Path) -> Result<ChatMessage, StoreError> {
    Ok(ChatMessage {
        id: id.clone(),
        chat_ref: ChatRoomId::parse(fields::req_str(raw, "chat_ref", path)?)
            .map_err(|e| StoreError::decode(path, e.to_string()))?,
        sender_ref: UserId::parse(fields::req_str(raw, "sender_ref", path)?)
            .map_err(|e| StoreError::decode(path, e.to_string()))?,
        body: fields::req_str(raw, "body", path)?,
        sent_at: fields::req_datetime(raw, "sent_at", path)?,
    })
}
