//! Activity events — the write-only feed of everything that happened.
//!
//! Emission is best-effort: the engine never rolls back a transition
//! because a sink failed.

use crate::error::ActivityError;
use crate::id::{AssignmentId, ChildId, ChoreId, ParentId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who caused an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Actor {
    Parent(ParentId),
    Child(ChildId),
    /// Lazy recurrence resets triggered on a write path.
    System,
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ChoreCreated,
    AssignmentCreated,
    Completed,
    Approved,
    Rejected,
    Reopened,
    Reset,
    Claimed,
    ReturnedToPool,
    AdjustmentRecorded,
}

/// A single activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: ActivityKind,
    pub actor: Actor,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chore_id: Option<ChoreId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<AssignmentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<ChildId>,

    /// Free-form detail (amount, rejection reason, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ActivityEvent {
    pub fn new(kind: ActivityKind, actor: Actor, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            kind,
            actor,
            chore_id: None,
            assignment_id: None,
            child_id: None,
            details: None,
        }
    }

    pub fn chore(mut self, chore_id: ChoreId) -> Self {
        self.chore_id = Some(chore_id);
        self
    }

    pub fn assignment(mut self, assignment_id: AssignmentId) -> Self {
        self.assignment_id = Some(assignment_id);
        self
    }

    pub fn child(mut self, child_id: ChildId) -> Self {
        self.child_id = Some(child_id);
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Trait for activity sinks (where events are written).
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn emit(&self, event: ActivityEvent) -> Result<(), ActivityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let chore_id = ChoreId::new();
        let child_id = ChildId::new();
        let event = ActivityEvent::new(ActivityKind::Claimed, Actor::Child(child_id), Utc::now())
            .chore(chore_id)
            .child(child_id)
            .details("first!");
        assert_eq!(event.chore_id, Some(chore_id));
        assert_eq!(event.child_id, Some(child_id));
        assert!(event.assignment_id.is_none());
        assert_eq!(event.details.as_deref(), Some("first!"));
    }

    #[test]
    fn actor_serializes_with_role_tag() {
        let json = serde_json::to_string(&Actor::System).unwrap();
        assert_eq!(json, r#"{"role":"system"}"#);

        let parent = ParentId::new();
        let json = serde_json::to_string(&Actor::Parent(parent)).unwrap();
        assert!(json.contains("\"role\":\"parent\""));
        assert!(json.contains(&parent.to_string()));
    }
}
