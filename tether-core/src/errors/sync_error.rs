//! Sync engine and adapter errors.

use thiserror::Error;

/// Errors raised while queueing or replaying mutations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No adapter is registered for the entity a mutation routes to.
    #[error("no sync adapter registered for entity '{entity}'")]
    AdapterMissing { entity: String },

    /// The adapter for `entity` has no handler for this sub-resource.
    #[error("adapter '{entity}' does not support resource '{resource}'")]
    UnsupportedResource { entity: String, resource: String },

    /// Replay reached the server but was rejected with an error status.
    #[error("replay of mutation {id} rejected with status {status}")]
    ReplayRejected { id: String, status: u16 },

    /// The transport could not reach the server at all.
    #[error("transport error: {reason}")]
    TransportError { reason: String },

    /// A draft failed enqueue-time validation.
    #[error("invalid mutation: {reason}")]
    InvalidMutation { reason: String },

    /// The outbox refused a new mutation because it is at capacity.
    #[error("outbox is full ({max} mutations)")]
    QueueFull { max: usize },

    /// A resolution was requested for a conflict that is not on the surface.
    #[error("no unresolved conflict for mutation {id}")]
    UnknownConflict { id: String },
}
