//! Cross-context bridge errors.

use thiserror::Error;

/// Errors from the background/foreground message bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The peer endpoint has been dropped.
    #[error("bridge channel closed")]
    Closed,
}
