//! Configuration structs and their defaults.

pub mod defaults;
pub mod sync_config;

pub use sync_config::{SyncConfig, TransportConfig};
