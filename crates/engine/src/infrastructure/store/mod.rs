//! Path store client.
//!
//! The underlying store is callback-based, schemaless and silent on
//! miss. This module turns that into something the repositories can
//! live with: slash-delimited `Path` addressing, deadline-bounded
//! futures, field-merge writes with null tombstones, and a typed
//! decode boundary.

mod client;
pub mod fields;
mod memory;
mod path;

pub use client::{StoreClient, Subscription};
pub use memory::MemoryPathStore;
pub use path::{collections, Path};
