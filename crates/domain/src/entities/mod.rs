//! Domain entities.

mod actor;
mod agreement;
mod card;
mod chat;
mod deck;
mod game;
mod position;
mod user;
mod vocab;

pub use actor::Actor;
pub use agreement::{Agreement, AgreementStatus, Party};
pub use card::Card;
pub use chat::{ChatKind, ChatMessage, ChatRoom};
pub use deck::Deck;
pub use game::{Game, GameStatus};
pub use position::Position;
pub use user::{User, UserRole};
pub use vocab::{Capability, Value};
