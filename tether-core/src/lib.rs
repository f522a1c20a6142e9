//! # tether-core
//!
//! Core types, traits, errors, and configuration for the tether offline
//! mutation-sync engine: the queued-mutation data model, the queue-store
//! and sync-adapter capability traits, per-domain error enums, and the
//! default constants everything else is configured from.

pub mod config;
pub mod errors;
pub mod models;
pub mod mutation;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::{SyncConfig, TransportConfig};
pub use errors::{BridgeError, StoreError, SyncError, TetherError, TetherResult};
pub use models::{
    ConflictPreview, ConflictRecord, ConflictResolution, ReplayResponse, Submission, SyncOutcome,
};
pub use mutation::{
    HttpMethod, MutationDraft, MutationId, MutationKind, MutationOp, QueuedMutation,
};
pub use traits::{IQueueStore, IReplayTransport, ISyncAdapter};
