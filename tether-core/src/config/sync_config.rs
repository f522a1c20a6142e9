//! Sync engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::{TetherError, TetherResult};

/// Top-level configuration for one engine instance.
///
/// Every field falls back to its `defaults` constant, so a partial TOML
/// file is always valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Key namespace for persisted queue entries.
    pub queue_prefix: String,
    /// Maximum queued mutations before enqueue refuses.
    pub max_queue: usize,
    /// Conflicts shown in a preview slice.
    pub conflict_preview: usize,
    /// Capacity of each bridge channel.
    pub bridge_capacity: usize,
    pub transport: TransportConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            queue_prefix: defaults::DEFAULT_QUEUE_PREFIX.to_string(),
            max_queue: defaults::DEFAULT_MAX_QUEUE,
            conflict_preview: defaults::DEFAULT_CONFLICT_PREVIEW,
            bridge_capacity: defaults::DEFAULT_BRIDGE_CAPACITY,
            transport: TransportConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Parse from a TOML string; missing fields take their defaults.
    pub fn from_toml_str(raw: &str) -> TetherResult<Self> {
        toml::from_str(raw).map_err(|e| TetherError::ConfigError {
            message: e.to_string(),
        })
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> TetherResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| TetherError::ConfigError {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml_str(&raw)
    }
}

/// HTTP replay transport configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Base url queued paths are resolved against. Empty means paths are
    /// sent as recorded.
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: defaults::DEFAULT_HTTP_TIMEOUT_SECS,
            max_retries: defaults::DEFAULT_MAX_RETRIES,
            initial_backoff_ms: defaults::DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: defaults::DEFAULT_MAX_BACKOFF_MS,
        }
    }
}
