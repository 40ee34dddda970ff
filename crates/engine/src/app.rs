//! Application composition.
//!
//! `App` owns the wired object graph: one repository set over one
//! store client, plus the aggregate loader, the position coalescer and
//! the edge reconciler on top. Construction is pure wiring; nothing
//! here touches the store.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::coalescer::PositionCoalescer;
use crate::infrastructure::identity::FixedIdentity;
use crate::infrastructure::notify::NoopNotifier;
use crate::infrastructure::persistence::Repositories;
use crate::infrastructure::ports::{ClockPort, IdentityPort, NotifierPort, PathStore};
use crate::infrastructure::store::MemoryPathStore;
use crate::use_cases::{EdgeReconciler, GameContextLoader};

pub struct App {
    pub config: EngineConfig,
    pub repos: Repositories,
    pub loader: GameContextLoader,
    pub coalescer: PositionCoalescer,
    pub reconciler: EdgeReconciler,
}

impl App {
    pub fn new(
        store: Arc<dyn PathStore>,
        clock: Arc<dyn ClockPort>,
        identity: Arc<dyn IdentityPort>,
        notifier: Arc<dyn NotifierPort>,
        config: EngineConfig,
    ) -> Self {
        let repos = Repositories::new(store, clock, identity, notifier, &config);
        let loader = GameContextLoader::new(repos.clone(), &config);
        let coalescer =
            PositionCoalescer::new(Arc::clone(&repos.positions), config.debounce_window);
        let reconciler = EdgeReconciler::new(repos.clone());
        Self {
            config,
            repos,
            loader,
            coalescer,
            reconciler,
        }
    }

    /// App over the in-memory store adapter, with the system clock and
    /// the given principal. Used by the binary and the end-to-end tests.
    pub fn in_memory(identity: FixedIdentity, config: EngineConfig) -> (Self, Arc<MemoryPathStore>) {
        let store = Arc::new(MemoryPathStore::new());
        let app = Self::new(
            Arc::clone(&store) as Arc<dyn PathStore>,
            Arc::new(SystemClock),
            Arc::new(identity),
            Arc::new(NoopNotifier),
            config,
        );
        (app, store)
    }
}
