//! Shared model types crossing crate boundaries.

pub mod conflict;
pub mod outcome;

pub use conflict::{payload_hash, ConflictPreview, ConflictRecord, ConflictResolution};
pub use outcome::{ReplayResponse, Submission, SyncOutcome};
