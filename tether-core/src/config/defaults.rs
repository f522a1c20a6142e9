//! Single source of truth for all default configuration values.

// --- Queue ---

/// Key namespace for persisted outbox entries.
pub const DEFAULT_QUEUE_PREFIX: &str = "http-outbox";

/// Maximum number of mutations the outbox will hold.
pub const DEFAULT_MAX_QUEUE: usize = 10_000;

// --- Conflicts ---

/// Number of conflicts shown in a preview slice.
pub const DEFAULT_CONFLICT_PREVIEW: usize = 3;

// --- Bridge ---

/// Capacity of each cross-context message channel.
pub const DEFAULT_BRIDGE_CAPACITY: usize = 64;

// --- Transport ---

/// Request timeout for replayed HTTP calls.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Retry attempts for transport-level failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// First retry backoff; doubles per attempt.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;

/// Backoff ceiling.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

// --- Store ---

/// SQLite busy timeout.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
