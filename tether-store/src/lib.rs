//! # tether-store
//!
//! Durable queue store for the Tether sync engine. A single SQLite
//! table holds queued mutations as JSON envelopes keyed by namespaced
//! string keys; an in-memory variant mirrors the same semantics for
//! tests and single-session callers.

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod queries;
pub mod sqlite;

// Re-export the store implementations at the crate root.
pub use memory::MemoryQueueStore;
pub use sqlite::SqliteQueueStore;
