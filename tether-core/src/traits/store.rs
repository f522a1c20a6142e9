//! Durable queue store contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::TetherResult;

/// Async key-value store holding pending mutations as JSON documents.
///
/// Keys are namespaced by the outbox (`<prefix>:<mutation-id>`); the store
/// is agnostic of what it holds. Writes must be durable before the returned
/// future resolves, and write failures must propagate, never be swallowed.
#[async_trait]
pub trait IQueueStore: Send + Sync {
    /// Fetch one value.
    async fn get(&self, key: &str) -> TetherResult<Option<Value>>;

    /// Durably write one value, replacing any existing one.
    async fn put(&self, key: &str, value: &Value) -> TetherResult<()>;

    /// Delete a key. Deleting an absent key succeeds silently.
    async fn delete(&self, key: &str) -> TetherResult<()>;

    /// All keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> TetherResult<Vec<String>>;
}
