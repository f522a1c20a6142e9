//! Adapter registry: concurrent entity-name lookup via DashMap.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use tether_core::errors::{SyncError, TetherResult};
use tether_core::traits::ISyncAdapter;

/// Thread-safe registry mapping entity names to their sync adapters.
///
/// Registration is insert-if-absent. The first adapter registered for an
/// entity name owns it for the life of the process; later registrations
/// under the same name are rejected with a warning rather than silently
/// swapping behavior under queued mutations.
pub struct AdapterRegistry {
    adapters: DashMap<String, Arc<dyn ISyncAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: DashMap::new(),
        }
    }

    /// Register `adapter` under its own entity name. Returns `true` when
    /// the adapter was installed, `false` when the name was already taken.
    pub fn register(&self, adapter: Arc<dyn ISyncAdapter>) -> bool {
        let entity = adapter.entity().to_string();
        match self.adapters.entry(entity) {
            Entry::Vacant(slot) => {
                tracing::debug!(entity = %slot.key(), "sync: registered adapter");
                slot.insert(adapter);
                true
            }
            Entry::Occupied(existing) => {
                tracing::warn!(
                    entity = %existing.key(),
                    "sync: adapter already registered, keeping the first"
                );
                false
            }
        }
    }

    /// Look up the adapter for `entity`. Absence is a hard error so a
    /// queued mutation never silently skips replay.
    pub fn resolve(&self, entity: &str) -> TetherResult<Arc<dyn ISyncAdapter>> {
        self.adapters
            .get(entity)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| {
                SyncError::AdapterMissing {
                    entity: entity.to_string(),
                }
                .into()
            })
    }

    /// All registered entity names, sorted.
    pub fn entities(&self) -> Vec<String> {
        let mut names: Vec<String> = self.adapters.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Entity names whose adapter participates in offline replay, sorted.
    pub fn offline_capable(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .adapters
            .iter()
            .filter(|r| r.value().can_sync_offline())
            .map(|r| r.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Number of registered adapters.
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;

    struct FakeAdapter {
        entity: &'static str,
        offline: bool,
        marker: &'static str,
    }

    impl FakeAdapter {
        fn new(entity: &'static str, marker: &'static str) -> Arc<Self> {
            Arc::new(Self {
                entity,
                offline: true,
                marker,
            })
        }
    }

    #[async_trait]
    impl ISyncAdapter for FakeAdapter {
        fn entity(&self) -> &str {
            self.entity
        }

        fn can_sync_offline(&self) -> bool {
            self.offline
        }

        async fn fetch_all(&self) -> TetherResult<Vec<Value>> {
            Ok(vec![Value::from(self.marker)])
        }

        async fn create(&self, _resource: &str, data: &Value) -> TetherResult<Value> {
            Ok(data.clone())
        }

        async fn update(&self, _resource: &str, _id: &str, data: &Value) -> TetherResult<Value> {
            Ok(data.clone())
        }

        async fn delete(&self, _resource: &str, _id: &str) -> TetherResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn first_registration_wins() {
        let registry = AdapterRegistry::new();
        assert!(registry.register(FakeAdapter::new("inventory", "first")));
        assert!(!registry.register(FakeAdapter::new("inventory", "second")));

        let adapter = registry.resolve("inventory").unwrap();
        let snapshot = adapter.fetch_all().await.unwrap();
        assert_eq!(snapshot, vec![Value::from("first")]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_adapter_is_a_hard_error() {
        let registry = AdapterRegistry::new();
        let err = registry.resolve("orders").err().unwrap();
        assert!(err.to_string().contains("orders"));
    }

    #[test]
    fn entities_are_sorted() {
        let registry = AdapterRegistry::new();
        registry.register(FakeAdapter::new("orders", "o"));
        registry.register(FakeAdapter::new("customers", "c"));
        registry.register(FakeAdapter::new("inventory", "i"));
        assert_eq!(registry.entities(), vec!["customers", "inventory", "orders"]);
    }

    #[test]
    fn offline_capable_filters_opted_out_adapters() {
        let registry = AdapterRegistry::new();
        registry.register(FakeAdapter::new("orders", "o"));
        registry.register(Arc::new(FakeAdapter {
            entity: "reports",
            offline: false,
            marker: "r",
        }));
        assert_eq!(registry.offline_capable(), vec!["orders"]);
    }
}
