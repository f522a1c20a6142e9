//! Wire-format messages exchanged with the embedding application.

use serde::{Deserialize, Serialize};

use tether_core::models::SyncOutcome;

/// Messages crossing the bridge, tagged by `type` on the wire.
///
/// `OutboxQueued` and `OutboxSynced` flow outward to the application;
/// `SyncNow` flows inward to request a replay pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeMessage {
    /// A mutation was accepted into the outbox while offline.
    OutboxQueued,
    /// A sync pass finished; counts describe the pass.
    OutboxSynced {
        ok: usize,
        fail: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        deferred: Option<usize>,
    },
    /// The application asks for a sync pass right now.
    SyncNow,
}

impl BridgeMessage {
    /// Wire form of a completed sync pass.
    pub fn synced(outcome: &SyncOutcome) -> Self {
        Self::OutboxSynced {
            ok: outcome.ok,
            fail: outcome.fail,
            deferred: (outcome.deferred > 0).then_some(outcome.deferred),
        }
    }
}
