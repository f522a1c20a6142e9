//! Serialized write access to the outbox database.

use std::path::Path;

use rusqlite::Connection;
use tokio::sync::Mutex;

use tether_core::errors::{StoreError, TetherResult};

use super::pragmas::apply_pragmas;

/// Single SQLite connection behind an async mutex.
///
/// SQLite permits one writer at a time, so every operation is funneled
/// through this handle; holders never block a thread waiting for it.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    /// Open (or create) the database at `path` and apply pragmas.
    pub fn open(path: &Path) -> TetherResult<Self> {
        let conn = Connection::open(path).map_err(|e| StoreError::OpenFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> TetherResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::OpenFailed {
            path: ":memory:".to_string(),
            message: e.to_string(),
        })?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with exclusive access to the connection.
    pub async fn with_conn<F, T>(&self, f: F) -> TetherResult<T>
    where
        F: FnOnce(&Connection) -> TetherResult<T>,
    {
        let conn = self.conn.lock().await;
        f(&conn)
    }
}
