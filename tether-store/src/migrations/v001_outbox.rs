//! V001: outbox_kv, the durable key-value table behind the queue.

pub const MIGRATION_SQL: &str = r#"
-- Queued mutations, one JSON envelope per key.
CREATE TABLE IF NOT EXISTS outbox_kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
) STRICT;
"#;
