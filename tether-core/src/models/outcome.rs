//! Sync pass outcomes and replay responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mutation::MutationId;

/// Counts from one sync pass.
///
/// `ok` mutations were replayed and removed. `fail` counts the first failed
/// mutation plus everything behind it that the halt left unattempted.
/// `deferred` counts mutations intentionally skipped this pass because of an
/// unresolved conflict on their target. On a halted pass the three counts
/// sum to the size of the queue snapshot the pass started from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub ok: usize,
    pub fail: usize,
    pub deferred: usize,
    /// True when the trigger found a pass already in flight and did nothing.
    #[serde(default)]
    pub coalesced: bool,
}

impl SyncOutcome {
    /// Outcome of a trigger that found a pass already running.
    pub fn coalesced() -> Self {
        Self {
            coalesced: true,
            ..Self::default()
        }
    }

    /// True when every queued mutation replayed successfully.
    pub fn is_clean(&self) -> bool {
        self.fail == 0 && self.deferred == 0
    }
}

/// Response surfaced by a replay transport, mirroring the `{ data, status }`
/// shape of the HTTP client collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ReplayResponse {
    pub fn ok(data: Option<Value>) -> Self {
        Self { status: 200, data }
    }

    /// 2xx check.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of an online-first submit: applied directly, or queued for later.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The direct transport call went through.
    Applied(ReplayResponse),
    /// Connectivity failed; the mutation was queued under this id.
    Queued(MutationId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_means_no_failures_and_no_deferrals() {
        let clean = SyncOutcome {
            ok: 3,
            ..SyncOutcome::default()
        };
        assert!(clean.is_clean());
        let halted = SyncOutcome {
            ok: 1,
            fail: 2,
            ..SyncOutcome::default()
        };
        assert!(!halted.is_clean());
        let deferred = SyncOutcome {
            ok: 2,
            deferred: 1,
            ..SyncOutcome::default()
        };
        assert!(!deferred.is_clean());
    }

    #[test]
    fn coalesced_outcome_is_empty() {
        let outcome = SyncOutcome::coalesced();
        assert!(outcome.coalesced);
        assert_eq!((outcome.ok, outcome.fail, outcome.deferred), (0, 0, 0));
    }

    #[test]
    fn success_is_any_2xx() {
        assert!(ReplayResponse { status: 204, data: None }.is_success());
        assert!(!ReplayResponse { status: 302, data: None }.is_success());
        assert!(!ReplayResponse { status: 500, data: None }.is_success());
    }
}
