//! Infrastructure: ports, the store client and its adapters, and the
//! process-local components built on top of them.

pub mod cache;
pub mod clock;
pub mod coalescer;
pub mod identity;
pub mod notify;
pub mod persistence;
pub mod ports;
pub mod store;
