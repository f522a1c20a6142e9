//! Error types for the tether workspace.
//!
//! One enum per domain, aggregated into [`TetherError`], which every public
//! API returns through the [`TetherResult`] alias.

pub mod bridge_error;
pub mod store_error;
pub mod sync_error;

pub use bridge_error::BridgeError;
pub use store_error::StoreError;
pub use sync_error::SyncError;

use thiserror::Error;

/// Workspace-wide result alias.
pub type TetherResult<T> = Result<T, TetherError>;

/// Aggregate error for all tether subsystems.
#[derive(Debug, Error)]
pub enum TetherError {
    /// Durable queue store failure.
    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    /// Queueing or replay failure.
    #[error("sync error: {0}")]
    SyncError(#[from] SyncError),

    /// Cross-context bridge failure.
    #[error("bridge error: {0}")]
    BridgeError(#[from] BridgeError),

    /// Configuration could not be read or parsed.
    #[error("config error: {message}")]
    ConfigError { message: String },
}
