//! # tether-sync
//!
//! Offline mutation sync: a durable outbox of deferred HTTP mutations,
//! per-entity sync adapters, an ordered fail-fast replay engine with
//! conflict detection, and a message bridge to the embedding application.

pub mod bridge;
pub mod conflict;
pub mod engine;
pub mod outbox;
pub mod registry;
pub mod transport;

// Re-export the working set at the crate root.
pub use bridge::{BridgeEndpoint, BridgeMessage};
pub use conflict::ConflictSurface;
pub use engine::SyncEngine;
pub use outbox::Outbox;
pub use registry::AdapterRegistry;
pub use transport::HttpReplayTransport;
