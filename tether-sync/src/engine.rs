//! SyncEngine: replays the outbox in order, detects conflicts, and talks
//! to the application over the bridge.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};

use tether_core::config::SyncConfig;
use tether_core::errors::{SyncError, TetherError, TetherResult};
use tether_core::models::{ConflictRecord, ConflictResolution, Submission, SyncOutcome};
use tether_core::mutation::{MutationDraft, MutationId, MutationKind, MutationOp, QueuedMutation};
use tether_core::traits::{IQueueStore, IReplayTransport, ISyncAdapter};

use crate::bridge::{BridgeEndpoint, BridgeMessage};
use crate::conflict::ConflictSurface;
use crate::outbox::Outbox;
use crate::registry::AdapterRegistry;
use crate::transport::HttpReplayTransport;

/// What a single replay attempt did.
enum ReplayStep {
    Applied,
    Conflicted(Box<ConflictRecord>),
    Failed(TetherError),
}

/// Orchestrates the offline mutation flow.
///
/// One engine per process. Triggers may arrive from anywhere (timers,
/// connectivity probes, the bridge); overlapping triggers coalesce into
/// the pass already running instead of replaying the queue twice.
pub struct SyncEngine {
    outbox: Arc<Outbox>,
    registry: Arc<AdapterRegistry>,
    transport: Arc<dyn IReplayTransport>,
    conflicts: Arc<ConflictSurface>,
    bridge: Arc<BridgeEndpoint>,
    /// Held for the duration of a pass; `try_lock` losers coalesce.
    flight: Mutex<()>,
    syncing: AtomicBool,
    last_outcome: RwLock<Option<SyncOutcome>>,
}

impl SyncEngine {
    /// Build an engine around `store` and `transport`. Returns the engine
    /// and the application's end of the bridge.
    pub fn new(
        store: Arc<dyn IQueueStore>,
        transport: Arc<dyn IReplayTransport>,
        config: SyncConfig,
    ) -> (Self, BridgeEndpoint) {
        let (engine_side, app_side) = BridgeEndpoint::pair(config.bridge_capacity);
        let bridge = Arc::new(engine_side);
        let engine = Self {
            outbox: Arc::new(Outbox::new(store, Arc::clone(&bridge), &config)),
            registry: Arc::new(AdapterRegistry::new()),
            transport,
            conflicts: Arc::new(ConflictSurface::new(config.conflict_preview)),
            bridge,
            flight: Mutex::new(()),
            syncing: AtomicBool::new(false),
            last_outcome: RwLock::new(None),
        };
        (engine, app_side)
    }

    /// Engine with the stock HTTP replay transport from `config.transport`.
    pub fn with_http_transport(
        store: Arc<dyn IQueueStore>,
        config: SyncConfig,
    ) -> TetherResult<(Self, BridgeEndpoint)> {
        let transport = Arc::new(HttpReplayTransport::new(config.transport.clone())?);
        Ok(Self::new(store, transport, config))
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn conflicts(&self) -> &ConflictSurface {
        &self.conflicts
    }

    /// Queued mutations awaiting replay.
    pub async fn pending_count(&self) -> usize {
        self.outbox.pending_count().await
    }

    /// Whether a pass is running right now.
    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }

    /// Counts from the most recent completed pass.
    pub async fn last_outcome(&self) -> Option<SyncOutcome> {
        *self.last_outcome.read().await
    }

    /// Replay the queue once, oldest first.
    ///
    /// Concurrent triggers coalesce: the loser returns immediately with a
    /// `coalesced` outcome and publishes nothing, trusting the pass in
    /// flight to report. A completed pass publishes `OUTBOX_SYNCED`.
    #[tracing::instrument(skip(self))]
    pub async fn sync_pending(&self) -> SyncOutcome {
        let Ok(_guard) = self.flight.try_lock() else {
            tracing::debug!("sync: pass already in flight, coalescing trigger");
            return SyncOutcome::coalesced();
        };

        self.syncing.store(true, Ordering::SeqCst);
        let outcome = self.run_pass().await;
        self.syncing.store(false, Ordering::SeqCst);

        *self.last_outcome.write().await = Some(outcome);
        self.bridge.publish(BridgeMessage::synced(&outcome));
        tracing::info!(
            ok = outcome.ok,
            fail = outcome.fail,
            deferred = outcome.deferred,
            "sync: pass complete"
        );
        outcome
    }

    async fn run_pass(&self) -> SyncOutcome {
        let queue = self.outbox.list().await;
        let total = queue.len();
        if total == 0 {
            tracing::debug!("sync: queue empty, nothing to replay");
            return SyncOutcome::default();
        }

        let mut ok = 0;
        let mut deferred = 0;
        // Targets frozen by a conflict earlier in this pass. Successors on
        // the same record must wait, or they would replay out of order.
        let mut held: HashSet<String> = HashSet::new();

        for mutation in &queue {
            if let Some(key) = mutation.target_key() {
                if held.contains(&key) {
                    tracing::debug!(id = %mutation.id, target = %key, "sync: deferred behind conflicted predecessor");
                    deferred += 1;
                    continue;
                }
            }

            match self.replay_one(mutation).await {
                ReplayStep::Applied => match self.outbox.remove(&mutation.id).await {
                    Ok(()) => ok += 1,
                    Err(e) => {
                        // Replay landed but the dequeue failed; halting keeps
                        // this pass from attempting anything further, and the
                        // record stays queued for the next one.
                        tracing::error!(id = %mutation.id, "sync: replayed but could not dequeue, halting: {e}");
                        break;
                    }
                },
                ReplayStep::Conflicted(record) => {
                    self.conflicts.report(*record).await;
                    if let Some(key) = mutation.target_key() {
                        held.insert(key);
                    }
                    deferred += 1;
                }
                ReplayStep::Failed(e) => {
                    tracing::warn!(id = %mutation.id, url = %mutation.url, "sync: replay failed, halting pass: {e}");
                    break;
                }
            }
        }

        // Whatever the halt left unattempted is still queued, same as the
        // mutation that tripped it.
        SyncOutcome {
            ok,
            fail: total - ok - deferred,
            deferred,
            coalesced: false,
        }
    }

    async fn replay_one(&self, mutation: &QueuedMutation) -> ReplayStep {
        match &mutation.kind {
            MutationKind::Raw => match self.transport.execute(mutation).await {
                Ok(resp) if resp.is_success() => ReplayStep::Applied,
                Ok(resp) => ReplayStep::Failed(
                    SyncError::ReplayRejected {
                        id: mutation.id.to_string(),
                        status: resp.status,
                    }
                    .into(),
                ),
                Err(e) => ReplayStep::Failed(e),
            },
            MutationKind::Entity {
                entity,
                resource,
                target_id,
                op,
            } => {
                let adapter = match self.registry.resolve(entity) {
                    Ok(adapter) => adapter,
                    Err(e) => return ReplayStep::Failed(e),
                };

                // Only updates race a remote edit; creates have no remote
                // counterpart yet and deletes win regardless of freshness.
                if *op == MutationOp::Update {
                    if let Some(record) = self
                        .check_conflict(&adapter, mutation, entity, resource, target_id.as_deref())
                        .await
                    {
                        return ReplayStep::Conflicted(Box::new(record));
                    }
                }

                let null = Value::Null;
                let body = mutation.body.as_ref().unwrap_or(&null);
                let target = target_id.as_deref().unwrap_or_default();
                let result = match op {
                    MutationOp::Create => adapter.create(resource, body).await.map(|_| ()),
                    MutationOp::Update => {
                        adapter.update(resource, target, body).await.map(|_| ())
                    }
                    MutationOp::Delete => adapter.delete(resource, target).await,
                };
                match result {
                    Ok(()) => ReplayStep::Applied,
                    Err(e) => ReplayStep::Failed(e),
                }
            }
        }
    }

    /// Conflict gate for a queued update: if the remote record changed
    /// after the mutation was queued AND the contents structurally
    /// diverge, the mutation is held instead of replayed.
    async fn check_conflict(
        &self,
        adapter: &Arc<dyn ISyncAdapter>,
        mutation: &QueuedMutation,
        entity: &str,
        resource: &str,
        target_id: Option<&str>,
    ) -> Option<ConflictRecord> {
        let target = target_id?;
        let queued_ms = mutation.queued_at.timestamp_millis().max(0) as u64;

        let remote_version = match adapter.remote_version(resource, target).await {
            Ok(version) => version,
            Err(e) => {
                tracing::debug!(id = %mutation.id, "sync: version probe failed, skipping conflict check: {e}");
                0
            }
        };
        if remote_version <= queued_ms {
            return None;
        }

        let local = mutation.body.clone().unwrap_or(Value::Null);
        match adapter.fetch_one(resource, target).await {
            Ok(Some(remote)) => {
                if adapter.detect_conflict(&local, &remote) {
                    Some(
                        ConflictRecord::new(
                            entity,
                            resource,
                            target,
                            mutation.id.clone(),
                            local,
                            remote,
                        )
                        .with_details(json!({
                            "remote_version": remote_version,
                            "queued_at_ms": queued_ms,
                        })),
                    )
                } else {
                    None
                }
            }
            // The record this update targets no longer exists remotely.
            Ok(None) => Some(
                ConflictRecord::new(
                    entity,
                    resource,
                    target,
                    mutation.id.clone(),
                    local,
                    Value::Null,
                )
                .with_details(json!({
                    "remote_version": remote_version,
                    "queued_at_ms": queued_ms,
                    "remote_missing": true,
                })),
            ),
            Err(e) => {
                tracing::debug!(id = %mutation.id, "sync: conflict probe failed, replaying anyway: {e}");
                None
            }
        }
    }

    /// Online-first front door: try the transport now, queue on
    /// connectivity failure. HTTP error statuses are returned to the
    /// caller as-is; queueing a request the server already rejected would
    /// just replay the rejection.
    pub async fn submit(&self, draft: MutationDraft) -> TetherResult<Submission> {
        draft.validate()?;
        let now = Utc::now();
        let probe = draft.clone().into_queued(MutationId::generate(now), now);

        match self.transport.execute(&probe).await {
            Ok(resp) => Ok(Submission::Applied(resp)),
            Err(TetherError::SyncError(SyncError::TransportError { reason })) => {
                tracing::info!("sync: offline, queueing mutation: {reason}");
                let id = self.outbox.enqueue(draft).await?;
                Ok(Submission::Queued(id))
            }
            Err(e) => Err(e),
        }
    }

    /// Consume inbound bridge messages until the application side drops.
    /// `SYNC_NOW` triggers a pass; anything else inbound is ignored.
    pub async fn listen(&self) {
        while let Some(msg) = self.bridge.recv().await {
            match msg {
                BridgeMessage::SyncNow => {
                    tracing::debug!("sync: pass requested over bridge");
                    self.sync_pending().await;
                }
                other => {
                    tracing::debug!("sync: ignoring inbound message: {other:?}");
                }
            }
        }
        tracing::debug!("sync: bridge closed, listener exiting");
    }

    /// Apply the caller's decision for a surfaced conflict.
    ///
    /// The conflict record is only released once the resolution sticks; any
    /// failure puts it back on the surface.
    pub async fn resolve_conflict(
        &self,
        id: &MutationId,
        resolution: ConflictResolution,
    ) -> TetherResult<()> {
        let record = self.conflicts.take(id).await.ok_or_else(|| {
            TetherError::from(SyncError::UnknownConflict { id: id.to_string() })
        })?;

        match resolution {
            ConflictResolution::KeepRemote => {
                // The remote value stands; abandon the queued mutation.
                if let Err(e) = self.outbox.remove(id).await {
                    self.conflicts.report(record).await;
                    return Err(e);
                }
                tracing::info!(id = %id, "sync: conflict resolved, kept remote");
            }
            ConflictResolution::KeepLocal => {
                // Push the queued local value over the remote record,
                // bypassing the freshness gate the caller just overruled.
                let applied: TetherResult<()> = async {
                    let adapter = self.registry.resolve(&record.entity)?;
                    adapter
                        .update(&record.resource, &record.target_id, &record.local)
                        .await?;
                    self.outbox.remove(id).await
                }
                .await;
                if let Err(e) = applied {
                    self.conflicts.report(record).await;
                    return Err(e);
                }
                tracing::info!(id = %id, "sync: conflict resolved, kept local");
            }
            ConflictResolution::Merge { merged } => {
                let mut mutation = match self.outbox.get(id).await {
                    Ok(Some(mutation)) => mutation,
                    Ok(None) => {
                        tracing::warn!(id = %id, "sync: conflicted mutation no longer queued, dropping stale conflict");
                        return Ok(());
                    }
                    Err(e) => {
                        self.conflicts.report(record).await;
                        return Err(e);
                    }
                };
                mutation.body = Some(merged);
                if let Err(e) = self.outbox.replace(&mutation).await {
                    self.conflicts.report(record).await;
                    return Err(e);
                }
                tracing::info!(id = %id, "sync: conflict resolved, merged payload queued for replay");
            }
        }
        Ok(())
    }
}
