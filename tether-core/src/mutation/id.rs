//! Mutation identifiers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier of a queued mutation.
///
/// Generated at enqueue time as zero-padded epoch milliseconds plus a random
/// suffix, so lexicographic order of ids roughly tracks the order mutations
/// were queued. Uniqueness holds for the id's lifetime in the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationId(pub String);

impl MutationId {
    /// Generate a fresh id stamped with `queued_at`.
    pub fn generate(queued_at: DateTime<Utc>) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!(
            "{:013}-{}",
            queued_at.timestamp_millis(),
            &suffix[..8]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MutationId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for MutationId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ids_sort_chronologically() {
        let early = MutationId::generate(Utc.timestamp_millis_opt(100).unwrap());
        let late = MutationId::generate(Utc.timestamp_millis_opt(2_000_000).unwrap());
        assert!(early < late);
    }

    #[test]
    fn ids_embed_the_millisecond_stamp() {
        let id = MutationId::generate(Utc.timestamp_millis_opt(42).unwrap());
        assert!(id.as_str().starts_with("0000000000042-"));
    }

    #[test]
    fn two_ids_for_the_same_instant_differ() {
        let at = Utc::now();
        assert_ne!(MutationId::generate(at), MutationId::generate(at));
    }

    #[test]
    fn serializes_as_a_bare_string() {
        let id = MutationId::from("0000000000042-abcd1234");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0000000000042-abcd1234\"");
    }
}
