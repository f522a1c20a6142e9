//! Capability traits implemented across the workspace.

pub mod adapter;
pub mod store;
pub mod transport;

pub use adapter::{structurally_diverged, value_id, ISyncAdapter};
pub use store::IQueueStore;
pub use transport::IReplayTransport;
