//! Conflict records and resolutions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mutation::MutationId;

/// Divergence between a queued local mutation and the authoritative remote
/// value, detected at replay time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Registry entity whose adapter detected the divergence.
    pub entity: String,
    /// Sub-resource discriminator.
    pub resource: String,
    /// Remote id of the contested record.
    pub target_id: String,
    /// The queued mutation that tripped detection; it stays queued until
    /// the conflict is resolved.
    pub mutation_id: MutationId,
    /// Value the client attempted to persist.
    pub local: Value,
    /// Authoritative server value. `null` when the remote record vanished.
    pub remote: Value,
    /// BLAKE3 of the serialized local payload, for log correlation.
    pub local_hash: String,
    /// BLAKE3 of the serialized remote payload.
    pub remote_hash: String,
    pub detected_at: DateTime<Utc>,
    /// Diagnostic payload captured at detection time, for display beside
    /// the conflicting values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ConflictRecord {
    pub fn new(
        entity: impl Into<String>,
        resource: impl Into<String>,
        target_id: impl Into<String>,
        mutation_id: MutationId,
        local: Value,
        remote: Value,
    ) -> Self {
        let local_hash = payload_hash(&local);
        let remote_hash = payload_hash(&remote);
        Self {
            entity: entity.into(),
            resource: resource.into(),
            target_id: target_id.into(),
            mutation_id,
            local,
            remote,
            local_hash,
            remote_hash,
            detected_at: Utc::now(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Caller-chosen resolution for a surfaced conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Re-apply the queued local mutation over the remote value.
    KeepLocal,
    /// Accept the remote value and discard the queued mutation.
    KeepRemote,
    /// Replace the queued body with a caller-merged payload, then replay.
    Merge { merged: Value },
}

/// Display slice of the conflict list: the first few records plus a count
/// of the remainder. Presentation policy only; the full list stays
/// addressable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictPreview {
    pub visible: Vec<ConflictRecord>,
    pub remainder: usize,
}

/// Hash of a JSON payload's serialized form, used to tell divergent
/// versions apart without dumping whole payloads into logs.
pub fn payload_hash(value: &Value) -> String {
    blake3::hash(value.to_string().as_bytes())
        .to_hex()
        .to_string()
}
