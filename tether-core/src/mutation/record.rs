//! Queued mutation records and enqueue-time validation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::MutationId;
use crate::errors::{SyncError, TetherResult};

/// HTTP method of a queued mutation. Mutating verbs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Logical operation an entity mutation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOp {
    Create,
    Update,
    Delete,
}

impl MutationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// How a mutation is replayed: as the recorded raw HTTP request, or routed
/// through the sync adapter registered for an entity.
///
/// The resource discriminator is a first-class, validated field here rather
/// than a routing key buried somewhere in the request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationKind {
    /// Replay the recorded request as-is.
    Raw,
    /// Route through the adapter registered for `entity`.
    Entity {
        entity: String,
        /// Sub-resource discriminator the adapter routes on internally.
        resource: String,
        /// Remote id of the record an update or delete targets.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_id: Option<String>,
        op: MutationOp,
    },
}

/// One durable queued mutation.
///
/// Removed from the store only when its replay succeeded or the caller
/// explicitly discarded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMutation {
    pub id: MutationId,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Merged over transport defaults at replay time.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(flatten)]
    pub kind: MutationKind,
    /// Defines replay order.
    pub queued_at: DateTime<Utc>,
}

impl QueuedMutation {
    /// Remote id this mutation targets, if it is an entity mutation
    /// carrying one.
    pub fn target_id(&self) -> Option<&str> {
        match &self.kind {
            MutationKind::Entity { target_id, .. } => target_id.as_deref(),
            MutationKind::Raw => None,
        }
    }

    /// Composite `entity:target` key identifying the remote record being
    /// mutated, when both parts are known.
    pub fn target_key(&self) -> Option<String> {
        match &self.kind {
            MutationKind::Entity {
                entity,
                target_id: Some(id),
                ..
            } => Some(format!("{entity}:{id}")),
            _ => None,
        }
    }
}

/// Caller-facing mutation input: everything but identity and timestamp,
/// which the outbox assigns at enqueue time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationDraft {
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(flatten)]
    pub kind: MutationKind,
}

impl MutationDraft {
    /// Draft for raw HTTP replay.
    pub fn raw(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: HashMap::new(),
            kind: MutationKind::Raw,
        }
    }

    /// Draft routed through the adapter registered for `entity`.
    pub fn entity(
        entity: impl Into<String>,
        resource: impl Into<String>,
        op: MutationOp,
        method: HttpMethod,
        url: impl Into<String>,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: HashMap::new(),
            kind: MutationKind::Entity {
                entity: entity.into(),
                resource: resource.into(),
                target_id: None,
                op,
            },
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the remote target id. No effect on raw drafts.
    pub fn with_target(mut self, id: impl Into<String>) -> Self {
        if let MutationKind::Entity { target_id, .. } = &mut self.kind {
            *target_id = Some(id.into());
        }
        self
    }

    /// Enqueue-time validation. Raw urls and bodies are opaque passthrough;
    /// entity routing fields must be complete.
    pub fn validate(&self) -> TetherResult<()> {
        if self.url.trim().is_empty() {
            return Err(SyncError::InvalidMutation {
                reason: "url must not be empty".to_string(),
            }
            .into());
        }
        if let MutationKind::Entity {
            entity,
            resource,
            target_id,
            op,
        } = &self.kind
        {
            if entity.trim().is_empty() {
                return Err(SyncError::InvalidMutation {
                    reason: "entity must not be empty".to_string(),
                }
                .into());
            }
            if resource.trim().is_empty() {
                return Err(SyncError::InvalidMutation {
                    reason: "resource must not be empty".to_string(),
                }
                .into());
            }
            if matches!(op, MutationOp::Update | MutationOp::Delete) && target_id.is_none() {
                return Err(SyncError::InvalidMutation {
                    reason: format!("{} on '{resource}' requires a target id", op.as_str()),
                }
                .into());
            }
            if matches!(op, MutationOp::Create | MutationOp::Update) && self.body.is_none() {
                return Err(SyncError::InvalidMutation {
                    reason: format!("{} on '{resource}' requires a body", op.as_str()),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Stamp the draft into a stored record.
    pub fn into_queued(self, id: MutationId, queued_at: DateTime<Utc>) -> QueuedMutation {
        QueuedMutation {
            id,
            method: self.method,
            url: self.url,
            body: self.body,
            headers: self.headers,
            kind: self.kind,
            queued_at,
        }
    }
}
