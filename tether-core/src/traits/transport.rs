//! Replay transport contract.

use async_trait::async_trait;

use crate::errors::TetherResult;
use crate::models::ReplayResponse;
use crate::mutation::QueuedMutation;

/// Executes the network call for one mutation replay.
///
/// Timeouts and cancellation live here, not in the engine. A transport
/// failure (unreachable, aborted) surfaces as an error; an HTTP error
/// status comes back as a non-2xx [`ReplayResponse`] for the engine to
/// judge.
#[async_trait]
pub trait IReplayTransport: Send + Sync {
    async fn execute(&self, mutation: &QueuedMutation) -> TetherResult<ReplayResponse>;
}
