//! Accord domain model.
//!
//! Pure types only: entities, strongly-typed ids and the status rules
//! that govern them. Storage and I/O concerns live in the engine crate;
//! nothing here touches the store.

pub mod entities;
pub mod error;
pub mod ids;

pub use entities::{
    Actor, Agreement, AgreementStatus, Capability, Card, ChatKind, ChatMessage, ChatRoom, Deck,
    Game, GameStatus, Party, Position, User, UserRole, Value,
};
pub use error::DomainError;
pub use ids::{
    slugify, ActorId, AgreementId, CapabilityId, CardId, ChatRoomId, DeckId, GameId, MessageId,
    UserId, ValueId,
};
