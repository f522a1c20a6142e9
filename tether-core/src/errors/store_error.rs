//! Durable queue store errors.

use thiserror::Error;

/// Errors from the durable queue store.
///
/// Write-path errors are fatal to the offline guarantee for the mutation
/// being persisted and must reach the caller; the read-path degrade policy
/// lives in the outbox, not here.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite call failed.
    #[error("sqlite error: {message}")]
    SqliteError { message: String },

    /// The database could not be opened.
    #[error("failed to open store at {path}: {message}")]
    OpenFailed { path: String, message: String },

    /// Schema migration did not complete.
    #[error("migration v{version} failed: {message}")]
    MigrationFailed { version: u32, message: String },

    /// A stored value could not be serialized or deserialized.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}
