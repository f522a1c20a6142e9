//! SQLite pragma configuration for the outbox store.

use rusqlite::Connection;

use tether_core::config::defaults::DEFAULT_BUSY_TIMEOUT_MS;
use tether_core::errors::{StoreError, TetherResult};

/// Apply the production pragma set to a fresh connection.
pub fn apply_pragmas(conn: &Connection) -> TetherResult<()> {
    conn.execute_batch(&format!(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = {DEFAULT_BUSY_TIMEOUT_MS};
         PRAGMA foreign_keys = ON;"
    ))
    .map_err(|e| StoreError::SqliteError {
        message: e.to_string(),
    })?;
    Ok(())
}

/// Confirm the connection actually ended up in WAL mode. In-memory
/// databases report `memory` and are exempt.
pub fn verify_wal_mode(conn: &Connection) -> TetherResult<()> {
    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .map_err(|e| StoreError::SqliteError {
            message: e.to_string(),
        })?;
    if !mode.eq_ignore_ascii_case("wal") && !mode.eq_ignore_ascii_case("memory") {
        return Err(StoreError::SqliteError {
            message: format!("expected WAL journal mode, got '{mode}'"),
        }
        .into());
    }
    Ok(())
}
