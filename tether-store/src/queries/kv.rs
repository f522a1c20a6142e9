//! Key-value queries against the `outbox_kv` table.

use chrono::Utc;
use rusqlite::Connection;
use serde_json::Value;

use tether_core::errors::{StoreError, TetherError, TetherResult};

fn to_store_err(e: rusqlite::Error) -> TetherError {
    StoreError::SqliteError {
        message: e.to_string(),
    }
    .into()
}

fn to_serde_err(e: serde_json::Error) -> TetherError {
    StoreError::SerializationError {
        message: e.to_string(),
    }
    .into()
}

/// Maps `QueryReturnedNoRows` to `None` instead of an error.
trait OptionalRow<T> {
    fn optional_row(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalRow<T> for Result<T, rusqlite::Error> {
    fn optional_row(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

pub fn get(conn: &Connection, key: &str) -> TetherResult<Option<Value>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM outbox_kv WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional_row()
        .map_err(to_store_err)?;
    match raw {
        Some(text) => Ok(Some(serde_json::from_str(&text).map_err(to_serde_err)?)),
        None => Ok(None),
    }
}

pub fn put(conn: &Connection, key: &str, value: &Value) -> TetherResult<()> {
    let text = serde_json::to_string(value).map_err(to_serde_err)?;
    conn.execute(
        "INSERT INTO outbox_kv (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        rusqlite::params![key, text, Utc::now().to_rfc3339()],
    )
    .map_err(to_store_err)?;
    Ok(())
}

pub fn delete(conn: &Connection, key: &str) -> TetherResult<()> {
    conn.execute("DELETE FROM outbox_kv WHERE key = ?1", [key])
        .map_err(to_store_err)?;
    Ok(())
}

pub fn keys_with_prefix(conn: &Connection, prefix: &str) -> TetherResult<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT key FROM outbox_kv WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key")
        .map_err(to_store_err)?;
    let rows = stmt
        .query_map([like_prefix(prefix)], |row| row.get::<_, String>(0))
        .map_err(to_store_err)?;
    let mut keys = Vec::new();
    for row in rows {
        keys.push(row.map_err(to_store_err)?);
    }
    Ok(keys)
}

/// Escape LIKE metacharacters so a literal prefix matches literally.
fn like_prefix(prefix: &str) -> String {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("{escaped}%")
}
