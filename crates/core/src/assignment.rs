//! Assignments — one child's instance of a chore and its approval state.

use crate::id::{AssignmentId, ChildId, ChoreId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an assignment sits in the completion/approval cycle.
///
/// ```text
/// Pending ──complete──▶ Completed ──approve──▶ Approved ──(cooldown)──▶ Pending
///    ▲                      │
///    └──reopen── Rejected ◀─┘ reject
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentState {
    Pending,
    Completed,
    Approved,
    Rejected,
}

impl AssignmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentState::Pending => "pending",
            AssignmentState::Completed => "completed",
            AssignmentState::Approved => "approved",
            AssignmentState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AssignmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AssignmentState::Pending),
            "completed" => Ok(AssignmentState::Completed),
            "approved" => Ok(AssignmentState::Approved),
            "rejected" => Ok(AssignmentState::Rejected),
            other => Err(format!("unknown assignment state '{other}'")),
        }
    }
}

/// A persisted assignment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub chore_id: ChoreId,
    pub child_id: ChildId,
    pub state: AssignmentState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,

    /// Set only while `Approved`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payable_amount: Option<Money>,

    /// Set only while `Rejected`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    /// A fresh row in `state`, with `completed_at` stamped when born completed.
    pub fn new(
        chore_id: ChoreId,
        child_id: ChildId,
        state: AssignmentState,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            chore_id,
            child_id,
            state,
            completed_at: (state == AssignmentState::Completed).then_some(now),
            approved_at: None,
            payable_amount: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite state and every cycle field with `transition`.
    pub fn apply(&mut self, transition: &StateTransition, now: DateTime<Utc>) {
        self.state = transition.state;
        self.completed_at = transition.completed_at;
        self.approved_at = transition.approved_at;
        self.payable_amount = transition.payable_amount;
        self.rejection_reason = transition.rejection_reason.clone();
        self.updated_at = now;
    }

    /// The amount this row contributes to the child's balance.
    pub fn earned(&self) -> Money {
        match (self.state, self.payable_amount) {
            (AssignmentState::Approved, Some(amount)) => amount,
            _ => Money::ZERO,
        }
    }
}

/// The new field values written by a conditional state update.
///
/// A transition replaces the state *and* all cycle fields together, so a
/// row can never carry a payout without being approved or a rejection
/// reason without being rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTransition {
    pub state: AssignmentState,
    pub completed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub payable_amount: Option<Money>,
    pub rejection_reason: Option<String>,
}

impl StateTransition {
    /// Back to `Pending` with every cycle field cleared.
    pub fn pending() -> Self {
        Self {
            state: AssignmentState::Pending,
            completed_at: None,
            approved_at: None,
            payable_amount: None,
            rejection_reason: None,
        }
    }

    pub fn completed(at: DateTime<Utc>) -> Self {
        Self {
            state: AssignmentState::Completed,
            completed_at: Some(at),
            ..Self::pending()
        }
    }

    pub fn approved(completed_at: Option<DateTime<Utc>>, at: DateTime<Utc>, amount: Money) -> Self {
        Self {
            state: AssignmentState::Approved,
            completed_at,
            approved_at: Some(at),
            payable_amount: Some(amount),
            rejection_reason: None,
        }
    }

    pub fn rejected(completed_at: Option<DateTime<Utc>>, reason: impl Into<String>) -> Self {
        Self {
            state: AssignmentState::Rejected,
            completed_at,
            approved_at: None,
            payable_amount: None,
            rejection_reason: Some(reason.into()),
        }
    }
}

/// A payout kept after its approved row left `Approved`.
///
/// Recurring rows are reset and pool rows are deleted once their cooldown
/// elapses. The money they paid stays earned, so the repository moves it
/// here in the same step that rewrites or removes the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub assignment_id: AssignmentId,
    pub chore_id: ChoreId,
    pub child_id: ChildId,
    pub amount: Money,
    pub approved_at: DateTime<Utc>,
}

impl Payout {
    /// The payout an approved row carries, if any.
    pub fn of(row: &Assignment) -> Option<Self> {
        match (row.state, row.payable_amount, row.approved_at) {
            (AssignmentState::Approved, Some(amount), Some(approved_at)) => Some(Self {
                assignment_id: row.id,
                chore_id: row.chore_id,
                child_id: row.child_id,
                amount,
                approved_at,
            }),
            _ => None,
        }
    }
}
