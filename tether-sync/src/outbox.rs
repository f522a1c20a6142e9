//! Outbox: the durable queue of deferred mutations.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use tether_core::config::SyncConfig;
use tether_core::errors::{StoreError, SyncError, TetherResult};
use tether_core::mutation::{MutationDraft, MutationId, QueuedMutation};
use tether_core::traits::IQueueStore;

use crate::bridge::{BridgeEndpoint, BridgeMessage};

/// Accepts mutations while offline and hands them back, oldest first,
/// when a sync pass wants them.
///
/// Writes propagate errors: losing a queued mutation silently would break
/// the offline guarantee. Reads degrade: a scan failure yields an empty
/// list and a corrupt entry is skipped, so one bad row never wedges the
/// whole queue.
pub struct Outbox {
    store: Arc<dyn IQueueStore>,
    bridge: Arc<BridgeEndpoint>,
    prefix: String,
    max_queue: usize,
}

impl Outbox {
    pub fn new(
        store: Arc<dyn IQueueStore>,
        bridge: Arc<BridgeEndpoint>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            store,
            bridge,
            prefix: config.queue_prefix.clone(),
            max_queue: config.max_queue,
        }
    }

    fn key_for(&self, id: &MutationId) -> String {
        format!("{}:{}", self.prefix, id.as_str())
    }

    fn scan_prefix(&self) -> String {
        format!("{}:", self.prefix)
    }

    /// Validate and persist a draft, assigning its id and timestamp.
    ///
    /// Emits `OUTBOX_QUEUED` over the bridge once the write is durable.
    #[tracing::instrument(skip(self, draft))]
    pub async fn enqueue(&self, draft: MutationDraft) -> TetherResult<MutationId> {
        draft.validate()?;

        if self.pending_count().await >= self.max_queue {
            return Err(SyncError::QueueFull {
                max: self.max_queue,
            }
            .into());
        }

        let queued_at = Utc::now();
        let id = MutationId::generate(queued_at);
        let record = draft.into_queued(id.clone(), queued_at);
        let envelope = to_envelope(&record)?;
        self.store.put(&self.key_for(&id), &envelope).await?;

        tracing::debug!(id = %id, url = %record.url, "outbox: queued mutation");
        self.bridge.publish(BridgeMessage::OutboxQueued);
        Ok(id)
    }

    /// Every queued mutation, sorted oldest first.
    ///
    /// The sort is load-bearing: a create must replay before the update
    /// that edits the created record.
    pub async fn list(&self) -> Vec<QueuedMutation> {
        let keys = match self.store.keys(&self.scan_prefix()).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("outbox: queue scan failed, treating as empty: {e}");
                return Vec::new();
            }
        };

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            match self.store.get(&key).await {
                Ok(Some(value)) => match serde_json::from_value::<QueuedMutation>(value) {
                    Ok(record) => entries.push(record),
                    Err(e) => {
                        tracing::warn!(key = %key, "outbox: skipping corrupt entry: {e}");
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key = %key, "outbox: skipping unreadable entry: {e}");
                }
            }
        }

        entries.sort_by(|a, b| (a.queued_at, &a.id.0).cmp(&(b.queued_at, &b.id.0)));
        entries
    }

    /// One queued mutation by id.
    pub async fn get(&self, id: &MutationId) -> TetherResult<Option<QueuedMutation>> {
        match self.store.get(&self.key_for(id)).await? {
            Some(value) => {
                let record = serde_json::from_value(value).map_err(|e| {
                    StoreError::SerializationError {
                        message: e.to_string(),
                    }
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Drop a mutation from the queue. Removing an id that is no longer
    /// queued is a no-op.
    pub async fn remove(&self, id: &MutationId) -> TetherResult<()> {
        self.store.delete(&self.key_for(id)).await
    }

    /// Overwrite a queued mutation in place, keeping its id and slot.
    pub async fn replace(&self, record: &QueuedMutation) -> TetherResult<()> {
        let envelope = to_envelope(record)?;
        self.store.put(&self.key_for(&record.id), &envelope).await
    }

    /// Number of queued mutations. Degrades to zero if the scan fails.
    pub async fn pending_count(&self) -> usize {
        match self.store.keys(&self.scan_prefix()).await {
            Ok(keys) => keys.len(),
            Err(e) => {
                tracing::warn!("outbox: queue count failed, treating as zero: {e}");
                0
            }
        }
    }
}

fn to_envelope(record: &QueuedMutation) -> TetherResult<Value> {
    serde_json::to_value(record).map_err(|e| {
        StoreError::SerializationError {
            message: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use tether_core::mutation::{HttpMethod, MutationOp};
    use tether_store::MemoryQueueStore;

    fn make_outbox(max_queue: usize) -> (Outbox, BridgeEndpoint) {
        let (engine_side, app_side) = BridgeEndpoint::pair(8);
        let config = SyncConfig {
            max_queue,
            ..SyncConfig::default()
        };
        let outbox = Outbox::new(
            Arc::new(MemoryQueueStore::new()),
            Arc::new(engine_side),
            &config,
        );
        (outbox, app_side)
    }

    fn draft(url: &str) -> MutationDraft {
        MutationDraft::raw(HttpMethod::Post, url).with_body(json!({ "n": 1 }))
    }

    #[tokio::test]
    async fn enqueue_persists_and_notifies() {
        let (outbox, app) = make_outbox(100);
        let id = outbox.enqueue(draft("/api/orders")).await.unwrap();

        let entries = outbox.list().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
        assert_eq!(entries[0].url, "/api/orders");
        assert_eq!(app.recv().await, Some(BridgeMessage::OutboxQueued));
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_before_storage() {
        let (outbox, _app) = make_outbox(100);
        let err = outbox.enqueue(draft("")).await.unwrap_err();
        assert!(err.to_string().contains("url"));
        assert_eq!(outbox.pending_count().await, 0);
    }

    #[tokio::test]
    async fn full_queue_refuses_new_mutations() {
        let (outbox, _app) = make_outbox(1);
        outbox.enqueue(draft("/api/a")).await.unwrap();
        let err = outbox.enqueue(draft("/api/b")).await.unwrap_err();
        assert!(err.to_string().contains("full"));
        assert_eq!(outbox.pending_count().await, 1);
    }

    #[tokio::test]
    async fn list_orders_by_queue_time_not_key_shape() {
        let store = Arc::new(MemoryQueueStore::new());
        let (engine_side, _app) = BridgeEndpoint::pair(8);
        let outbox = Outbox::new(store.clone(), Arc::new(engine_side), &SyncConfig::default());

        // Handcraft records whose storage keys sort against their timestamps.
        let early = Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();
        let newer = MutationDraft::entity(
            "inventory",
            "warehouse",
            MutationOp::Update,
            HttpMethod::Put,
            "/api/w/1",
        )
        .with_target("1")
        .with_body(json!({"name": "B"}))
        .into_queued(MutationId::from("a-newer"), late);
        let older = MutationDraft::entity(
            "inventory",
            "warehouse",
            MutationOp::Create,
            HttpMethod::Post,
            "/api/w",
        )
        .with_body(json!({"name": "A"}))
        .into_queued(MutationId::from("z-older"), early);

        for record in [&newer, &older] {
            let key = format!("http-outbox:{}", record.id.as_str());
            store
                .put(&key, &serde_json::to_value(record).unwrap())
                .await
                .unwrap();
        }

        let entries = outbox.list().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id.as_str(), "z-older");
        assert_eq!(entries[1].id.as_str(), "a-newer");
    }

    #[tokio::test]
    async fn corrupt_entries_are_skipped_not_fatal() {
        let store = Arc::new(MemoryQueueStore::new());
        let (engine_side, _app) = BridgeEndpoint::pair(8);
        let outbox = Outbox::new(store.clone(), Arc::new(engine_side), &SyncConfig::default());

        outbox.enqueue(draft("/api/good")).await.unwrap();
        store
            .put("http-outbox:0000000000000-garbage", &json!({ "not": "a mutation" }))
            .await
            .unwrap();

        let entries = outbox.list().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "/api/good");
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (outbox, _app) = make_outbox(100);
        let id = outbox.enqueue(draft("/api/orders")).await.unwrap();
        outbox.remove(&id).await.unwrap();
        outbox.remove(&id).await.unwrap();
        assert!(outbox.list().await.is_empty());
    }

    #[tokio::test]
    async fn replace_swaps_the_payload_in_place() {
        let (outbox, _app) = make_outbox(100);
        let id = outbox.enqueue(draft("/api/orders")).await.unwrap();

        let mut record = outbox.get(&id).await.unwrap().unwrap();
        record.body = Some(json!({ "n": 2 }));
        outbox.replace(&record).await.unwrap();

        let entries = outbox.list().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, Some(json!({ "n": 2 })));
    }
}
