//! The queued-mutation data model.
//!
//! A [`QueuedMutation`] is one deferred HTTP mutation: what to send, how to
//! route it at replay time, and when it was queued. Callers build a
//! [`MutationDraft`]; the outbox validates it and stamps identity at
//! enqueue time.

pub mod id;
pub mod record;

pub use id::MutationId;
pub use record::{HttpMethod, MutationDraft, MutationKind, MutationOp, QueuedMutation};
