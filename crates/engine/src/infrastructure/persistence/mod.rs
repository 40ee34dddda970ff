//! Persistence adapters over the path store.
//!
//! One repository per entity type, each responsible for validation,
//! timestamp/ownership stamping, cache invalidation and the store
//! writes for the entity and its side of any relationship maps.

mod actor_repository;
mod agreement_repository;
mod card_repository;
mod chat_repository;
mod deck_repository;
mod edges;
mod game_repository;
mod position_repository;
mod user_repository;
mod vocab_repository;

pub use actor_repository::{ActorRepository, ActorUpdate};
pub use agreement_repository::AgreementRepository;
pub use card_repository::CardRepository;
pub use chat_repository::{ChatRepository, ChatRoomUpdate};
pub use deck_repository::{DeckRepository, DeckUpdate};
pub use edges::RelationshipIndex;
pub use game_repository::{GameRepository, GameUpdate};
pub use position_repository::PositionRepository;
pub use user_repository::{UserRepository, UserUpdate};
pub use vocab_repository::VocabRepository;

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::infrastructure::cache::EntityCache;
use crate::infrastructure::ports::{ClockPort, IdentityPort, NotifierPort, PathStore};
use crate::infrastructure::store::StoreClient;

/// Shared plumbing every repository holds.
#[derive(Clone)]
pub struct RepoContext {
    pub client: Arc<StoreClient>,
    pub cache: Arc<EntityCache>,
    pub clock: Arc<dyn ClockPort>,
    pub edges: Arc<RelationshipIndex>,
}

/// Combined repository set, constructed once per process.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<UserRepository>,
    pub games: Arc<GameRepository>,
    pub actors: Arc<ActorRepository>,
    pub cards: Arc<CardRepository>,
    pub decks: Arc<DeckRepository>,
    pub vocab: Arc<VocabRepository>,
    pub agreements: Arc<AgreementRepository>,
    pub chats: Arc<ChatRepository>,
    pub positions: Arc<PositionRepository>,
    pub edges: Arc<RelationshipIndex>,
}

impl Repositories {
    pub fn new(
        store: Arc<dyn PathStore>,
        clock: Arc<dyn ClockPort>,
        identity: Arc<dyn IdentityPort>,
        notifier: Arc<dyn NotifierPort>,
        config: &EngineConfig,
    ) -> Self {
        let client = Arc::new(StoreClient::new(store, config));
        let cache = Arc::new(EntityCache::new());
        let edges = Arc::new(RelationshipIndex::new(Arc::clone(&client)));
        let ctx = RepoContext {
            client,
            cache,
            clock,
            edges: Arc::clone(&edges),
        };

        Self {
            users: Arc::new(UserRepository::new(ctx.clone())),
            games: Arc::new(GameRepository::new(ctx.clone(), Arc::clone(&identity))),
            actors: Arc::new(ActorRepository::new(ctx.clone(), Arc::clone(&identity))),
            cards: Arc::new(CardRepository::new(ctx.clone())),
            decks: Arc::new(DeckRepository::new(ctx.clone(), config.shard_threshold)),
            vocab: Arc::new(VocabRepository::new(ctx.clone())),
            agreements: Arc::new(AgreementRepository::new(ctx.clone(), notifier)),
            chats: Arc::new(ChatRepository::new(ctx.clone())),
            positions: Arc::new(PositionRepository::new(ctx)),
            edges,
        }
    }
}
