//! Test doubles and helpers for tether integration scenarios.
//!
//! Provides a scriptable replay transport, a configurable in-memory sync
//! adapter, a store that always fails, and draft constructors shared by the
//! cross-crate tests under `tests/`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use tether_core::errors::{StoreError, SyncError, TetherResult};
use tether_core::models::ReplayResponse;
use tether_core::mutation::{HttpMethod, MutationDraft, MutationOp, QueuedMutation};
use tether_core::traits::{IQueueStore, IReplayTransport, ISyncAdapter};

static INIT: Once = Once::new();

/// Initialize test logging. Respects `TETHER_LOG`; output attaches to the
/// running test. Idempotent.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_env("TETHER_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

// ─── scripted transport ───

/// What the scripted transport should do for a url.
#[derive(Debug, Clone, Copy)]
pub enum ScriptedReply {
    /// Respond with this HTTP status.
    Status(u16),
    /// Fail at the transport level, as a dead network would.
    Offline,
}

/// Replay transport driven by a per-url script.
///
/// Records every call and tracks how many executions overlapped, which is
/// what the single-flight tests assert on.
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, ScriptedReply>>,
    default: Mutex<ScriptedReply>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedTransport {
    /// Transport that answers 200 to everything.
    pub fn online() -> Self {
        Self::with_default(ScriptedReply::Status(200))
    }

    /// Transport that fails every call at the wire.
    pub fn offline() -> Self {
        Self::with_default(ScriptedReply::Offline)
    }

    fn with_default(default: ScriptedReply) -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            default: Mutex::new(default),
            delay: None,
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Script the reply for one url. Callable mid-test through an `Arc`.
    pub fn script(&self, url: &str, reply: ScriptedReply) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    /// Make every execution take this long. Lets tests overlap triggers.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Change the fallback reply mid-test (go offline, come back).
    pub fn set_default(&self, reply: ScriptedReply) {
        *self.default.lock().unwrap() = reply;
    }

    /// Urls executed so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of executions that were ever in flight at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IReplayTransport for ScriptedTransport {
    async fn execute(&self, mutation: &QueuedMutation) -> TetherResult<ReplayResponse> {
        self.calls.lock().unwrap().push(mutation.url.clone());
        let in_flight = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(in_flight, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&mutation.url)
            .copied()
            .unwrap_or(*self.default.lock().unwrap());

        self.active.fetch_sub(1, Ordering::SeqCst);
        match reply {
            ScriptedReply::Status(status) => Ok(ReplayResponse {
                status,
                data: Some(json!({ "url": mutation.url })),
            }),
            ScriptedReply::Offline => Err(SyncError::TransportError {
                reason: format!("scripted offline for {}", mutation.url),
            }
            .into()),
        }
    }
}

// ─── stub adapter ───

/// In-memory sync adapter for one entity with a fixed resource set.
///
/// Holds a fake remote dataset keyed by `resource/id`, records every
/// mutating call, and rejects resources outside its set the way a real
/// adapter must: loudly, naming the resource.
pub struct StubAdapter {
    entity: String,
    resources: Vec<String>,
    remote: Mutex<HashMap<String, Value>>,
    versions: Mutex<HashMap<String, u64>>,
    calls: Mutex<Vec<String>>,
    offline_capable: bool,
    created: AtomicUsize,
}

impl StubAdapter {
    pub fn new(entity: &str, resources: &[&str]) -> Self {
        Self {
            entity: entity.to_string(),
            resources: resources.iter().map(|r| r.to_string()).collect(),
            remote: Mutex::new(HashMap::new()),
            versions: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            offline_capable: true,
            created: AtomicUsize::new(0),
        }
    }

    pub fn offline_incapable(mut self) -> Self {
        self.offline_capable = false;
        self
    }

    /// Seed a remote record.
    pub fn with_remote(self, resource: &str, id: &str, value: Value) -> Self {
        self.remote
            .lock()
            .unwrap()
            .insert(format!("{resource}/{id}"), value);
        self
    }

    /// Seed the freshness token for a remote record, in epoch millis.
    pub fn with_remote_version(self, resource: &str, id: &str, version: u64) -> Self {
        self.versions
            .lock()
            .unwrap()
            .insert(format!("{resource}/{id}"), version);
        self
    }

    /// Overwrite a remote record mid-test, bumping its version.
    pub fn edit_remote(&self, resource: &str, id: &str, value: Value, version: u64) {
        let key = format!("{resource}/{id}");
        self.remote.lock().unwrap().insert(key.clone(), value);
        self.versions.lock().unwrap().insert(key, version);
    }

    /// Remove a remote record mid-test, as a concurrent delete would.
    pub fn drop_remote(&self, resource: &str, id: &str) {
        let key = format!("{resource}/{id}");
        self.remote.lock().unwrap().remove(&key);
        self.versions.lock().unwrap().remove(&key);
    }

    /// Current value of a remote record.
    pub fn remote_value(&self, resource: &str, id: &str) -> Option<Value> {
        self.remote
            .lock()
            .unwrap()
            .get(&format!("{resource}/{id}"))
            .cloned()
    }

    /// Mutating calls made so far, in order, as `"op resource id"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn check_resource(&self, resource: &str) -> TetherResult<()> {
        if self.resources.iter().any(|r| r == resource) {
            Ok(())
        } else {
            Err(SyncError::UnsupportedResource {
                entity: self.entity.clone(),
                resource: resource.to_string(),
            }
            .into())
        }
    }
}

#[async_trait]
impl ISyncAdapter for StubAdapter {
    fn entity(&self) -> &str {
        &self.entity
    }

    fn can_sync_offline(&self) -> bool {
        self.offline_capable
    }

    async fn fetch_all(&self) -> TetherResult<Vec<Value>> {
        Ok(self.remote.lock().unwrap().values().cloned().collect())
    }

    async fn fetch_one(&self, resource: &str, id: &str) -> TetherResult<Option<Value>> {
        self.check_resource(resource)?;
        Ok(self.remote_value(resource, id))
    }

    async fn create(&self, resource: &str, data: &Value) -> TetherResult<Value> {
        self.check_resource(resource)?;
        let id = tether_core::traits::value_id(data)
            .unwrap_or_else(|| format!("gen-{}", self.created.fetch_add(1, Ordering::SeqCst) + 1));
        self.calls
            .lock()
            .unwrap()
            .push(format!("create {resource} {id}"));
        self.remote
            .lock()
            .unwrap()
            .insert(format!("{resource}/{id}"), data.clone());
        Ok(data.clone())
    }

    async fn update(&self, resource: &str, id: &str, data: &Value) -> TetherResult<Value> {
        self.check_resource(resource)?;
        self.calls
            .lock()
            .unwrap()
            .push(format!("update {resource} {id}"));
        self.remote
            .lock()
            .unwrap()
            .insert(format!("{resource}/{id}"), data.clone());
        Ok(data.clone())
    }

    async fn delete(&self, resource: &str, id: &str) -> TetherResult<()> {
        self.check_resource(resource)?;
        self.calls
            .lock()
            .unwrap()
            .push(format!("delete {resource} {id}"));
        self.remote.lock().unwrap().remove(&format!("{resource}/{id}"));
        Ok(())
    }

    async fn remote_version(&self, resource: &str, id: &str) -> TetherResult<u64> {
        self.check_resource(resource)?;
        Ok(self
            .versions
            .lock()
            .unwrap()
            .get(&format!("{resource}/{id}"))
            .copied()
            .unwrap_or(1))
    }
}

// ─── failing store ───

/// Queue store where every operation fails, for degrade-path tests.
pub struct FailingStore;

fn injected() -> tether_core::errors::TetherError {
    StoreError::SqliteError {
        message: "injected store failure".to_string(),
    }
    .into()
}

#[async_trait]
impl IQueueStore for FailingStore {
    async fn get(&self, _key: &str) -> TetherResult<Option<Value>> {
        Err(injected())
    }

    async fn put(&self, _key: &str, _value: &Value) -> TetherResult<()> {
        Err(injected())
    }

    async fn delete(&self, _key: &str) -> TetherResult<()> {
        Err(injected())
    }

    async fn keys(&self, _prefix: &str) -> TetherResult<Vec<String>> {
        Err(injected())
    }
}

// ─── draft constructors ───

/// Raw POST draft with an empty JSON body.
pub fn raw_draft(url: &str) -> MutationDraft {
    MutationDraft::raw(HttpMethod::Post, url).with_body(json!({}))
}

pub fn create_draft(entity: &str, resource: &str, body: Value) -> MutationDraft {
    MutationDraft::entity(
        entity,
        resource,
        MutationOp::Create,
        HttpMethod::Post,
        format!("/api/{entity}/{resource}"),
    )
    .with_body(body)
}

pub fn update_draft(entity: &str, resource: &str, id: &str, body: Value) -> MutationDraft {
    MutationDraft::entity(
        entity,
        resource,
        MutationOp::Update,
        HttpMethod::Put,
        format!("/api/{entity}/{resource}/{id}"),
    )
    .with_target(id)
    .with_body(body)
}

pub fn delete_draft(entity: &str, resource: &str, id: &str) -> MutationDraft {
    MutationDraft::entity(
        entity,
        resource,
        MutationOp::Delete,
        HttpMethod::Delete,
        format!("/api/{entity}/{resource}/{id}"),
    )
    .with_target(id)
}
