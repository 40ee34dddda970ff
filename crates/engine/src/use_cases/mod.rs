//! Use cases: multi-entity orchestration over the repositories.

mod game_context;
mod reconcile;

pub use game_context::{
    ActorEntry, AgreementEntry, DeckCounts, GameContext, GameContextLoader, Resolved,
};
pub use reconcile::{EdgeReconciler, ReconcileReport, RepairedEdge};
