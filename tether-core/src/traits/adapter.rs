//! Per-entity sync adapter capability set.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::TetherResult;

/// Remote operations for one logical entity, registered once at startup.
///
/// One adapter may serve several sub-resource shapes (an "inventory"
/// adapter handling `warehouse`, `stock_move` and `alert_config`); every
/// operation takes the `resource` discriminator and must fail loudly with
/// an error naming the resource for sub-resources it does not handle,
/// never silently no-op.
#[async_trait]
pub trait ISyncAdapter: Send + Sync {
    /// Registry key, unique per process.
    fn entity(&self) -> &str;

    /// Whether this entity supports the offline path at all.
    fn can_sync_offline(&self) -> bool {
        true
    }

    /// Current entity snapshot, used to repopulate callers after a sync.
    async fn fetch_all(&self) -> TetherResult<Vec<Value>>;

    /// Point read used by conflict detection. The default scans
    /// [`fetch_all`](Self::fetch_all) for a matching `id` field; adapters
    /// with a cheap point endpoint should override it.
    async fn fetch_one(&self, resource: &str, id: &str) -> TetherResult<Option<Value>> {
        let _ = resource;
        Ok(self
            .fetch_all()
            .await?
            .into_iter()
            .find(|candidate| value_id(candidate).as_deref() == Some(id)))
    }

    /// Create a remote record from `data`, returning the stored value.
    async fn create(&self, resource: &str, data: &Value) -> TetherResult<Value>;

    /// Update remote record `id` with `data`, returning the stored value.
    async fn update(&self, resource: &str, id: &str, data: &Value) -> TetherResult<Value>;

    /// Delete remote record `id`.
    async fn delete(&self, resource: &str, id: &str) -> TetherResult<()>;

    /// Freshness token of the remote record as a monotonic integer,
    /// typically a modified-at timestamp in epoch milliseconds. Defaults to
    /// `1`, the safe stand-in when no real versioning exists; the engine
    /// degrades fetch failures to `0`.
    async fn remote_version(&self, resource: &str, id: &str) -> TetherResult<u64> {
        let _ = (resource, id);
        Ok(1)
    }

    /// Structural comparison of the locally intended value against the
    /// remote one. `true` means the two diverged.
    fn detect_conflict(&self, local: &Value, remote: &Value) -> bool {
        structurally_diverged(local, remote)
    }
}

/// The `id` field of a JSON record as a string, whichever scalar it is.
pub fn value_id(value: &Value) -> Option<String> {
    match value.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Keys ignored by the default conflict comparison: identity and volatile
/// server bookkeeping, not user content.
const BOOKKEEPING_KEYS: &[&str] = &["id", "resource", "version", "updated_at", "created_at"];

/// Default [`ISyncAdapter::detect_conflict`]: field-by-field comparison
/// with bookkeeping keys stripped from both sides.
pub fn structurally_diverged(local: &Value, remote: &Value) -> bool {
    match (local, remote) {
        (Value::Object(l), Value::Object(r)) => {
            let keys: BTreeSet<&String> = l
                .keys()
                .chain(r.keys())
                .filter(|k| !BOOKKEEPING_KEYS.contains(&k.as_str()))
                .collect();
            keys.into_iter().any(|k| l.get(k) != r.get(k))
        }
        (l, r) => l != r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_content_does_not_diverge() {
        let local = json!({"id": "w1", "name": "Main", "updated_at": "2026-01-01"});
        let remote = json!({"id": "w1", "name": "Main", "updated_at": "2026-02-02"});
        assert!(!structurally_diverged(&local, &remote));
    }

    #[test]
    fn changed_field_diverges() {
        let local = json!({"id": "w1", "name": "A"});
        let remote = json!({"id": "w1", "name": "B"});
        assert!(structurally_diverged(&local, &remote));
    }

    #[test]
    fn missing_field_diverges() {
        let local = json!({"name": "Main", "capacity": 10});
        let remote = json!({"name": "Main"});
        assert!(structurally_diverged(&local, &remote));
    }

    #[test]
    fn non_object_payloads_compare_directly() {
        assert!(structurally_diverged(&json!("a"), &json!("b")));
        assert!(!structurally_diverged(&json!(3), &json!(3)));
    }

    #[test]
    fn value_id_reads_strings_and_numbers() {
        assert_eq!(value_id(&json!({"id": "w1"})).as_deref(), Some("w1"));
        assert_eq!(value_id(&json!({"id": 7})).as_deref(), Some("7"));
        assert_eq!(value_id(&json!({"name": "x"})), None);
    }
}
