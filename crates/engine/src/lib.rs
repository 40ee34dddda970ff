//! Accord engine.
//!
//! Service-side code mapping the strongly-typed domain model onto a
//! schemaless, path-addressed, eventually-consistent store.
//!
//! ## Structure
//!
//! - `infrastructure/` - ports, the store client, persistence adapters,
//!   cache and write coalescer
//! - `use_cases/` - read-model assembly and edge reconciliation
//! - `app` - application composition
//! - `config` - engine tunables

pub mod app;
pub mod config;
pub mod infrastructure;
pub mod use_cases;

/// End-to-end tests against the in-memory store adapter.
#[cfg(test)]
mod integration_tests;

pub use app::App;
pub use config::EngineConfig;
