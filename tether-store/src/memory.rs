//! MemoryQueueStore: volatile store for tests and single-session use.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use tether_core::errors::TetherResult;
use tether_core::traits::IQueueStore;

/// In-memory queue store. Nothing survives a restart; the ordering
/// and prefix semantics match [`SqliteQueueStore`](crate::SqliteQueueStore).
#[derive(Default)]
pub struct MemoryQueueStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IQueueStore for MemoryQueueStore {
    async fn get(&self, key: &str) -> TetherResult<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &Value) -> TetherResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> TetherResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> TetherResult<Vec<String>> {
        let entries = self.entries.read().await;
        let keys = entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        Ok(keys)
    }
}
