//! SqliteQueueStore: the durable, file-backed queue store.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use tether_core::errors::TetherResult;
use tether_core::traits::IQueueStore;

use crate::migrations;
use crate::pool::pragmas::verify_wal_mode;
use crate::pool::WriteConnection;

/// Durable key-value store for queued mutations.
///
/// Every value survives process restarts. Writes go through a single
/// serialized connection; the outbox layer above decides what degrades
/// and what propagates.
pub struct SqliteQueueStore {
    conn: WriteConnection,
}

impl SqliteQueueStore {
    /// Open (or create) the store at `path`.
    pub async fn open(path: &Path) -> TetherResult<Self> {
        let store = Self {
            conn: WriteConnection::open(path)?,
        };
        store.initialize().await?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub async fn open_in_memory() -> TetherResult<Self> {
        let store = Self {
            conn: WriteConnection::open_in_memory()?,
        };
        store.initialize().await?;
        Ok(store)
    }

    /// Run migrations and verify pragmas.
    async fn initialize(&self) -> TetherResult<()> {
        self.conn.with_conn(|conn| {
            verify_wal_mode(conn)?;
            migrations::run(conn)
        })
        .await
    }
}

#[async_trait]
impl IQueueStore for SqliteQueueStore {
    async fn get(&self, key: &str) -> TetherResult<Option<Value>> {
        self.conn
            .with_conn(|conn| crate::queries::kv::get(conn, key))
            .await
    }

    async fn put(&self, key: &str, value: &Value) -> TetherResult<()> {
        self.conn
            .with_conn(|conn| crate::queries::kv::put(conn, key, value))
            .await
    }

    async fn delete(&self, key: &str) -> TetherResult<()> {
        self.conn
            .with_conn(|conn| crate::queries::kv::delete(conn, key))
            .await
    }

    async fn keys(&self, prefix: &str) -> TetherResult<Vec<String>> {
        self.conn
            .with_conn(|conn| crate::queries::kv::keys_with_prefix(conn, prefix))
            .await
    }
}
