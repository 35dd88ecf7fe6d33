//! Error types for the Choreboard domain.
//!
//! Uses `thiserror` for ergonomic error definitions. [`Error`] is the
//! caller-facing taxonomy returned by every engine operation; the store and
//! activity bounded contexts have their own enums.

use crate::assignment::AssignmentState;
use crate::id::{AssignmentId, ChildId, ChoreId};
use crate::money::Money;
use thiserror::Error;

/// The top-level error type for all engine operations.
///
/// Every variant is a deterministic outcome except [`Error::Store`], which
/// carries a backend failure through unchanged so the caller can decide on
/// retries.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    #[error("Invalid reward range: minimum {min} must be below maximum {max}")]
    InvalidRewardRange { min: Money, max: Money },

    #[error("Reward {amount} is outside the allowed range {min} to {max}")]
    RewardOutOfRange { amount: Money, min: Money, max: Money },

    #[error("Cannot {action} assignment {assignment_id} while it is {state}")]
    InvalidTransition {
        assignment_id: AssignmentId,
        state: AssignmentState,
        action: &'static str,
    },

    #[error("Chore {chore_id} has already been claimed")]
    AlreadyClaimed { chore_id: ChoreId },

    #[error("Insufficient balance: {balance} available, adjustment of {amount} would go negative")]
    InsufficientBalance { balance: Money, amount: Money },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Store error: {0}")]
    Store(StoreError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable, machine-readable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidDistribution,
    InvalidRewardRange,
    RewardOutOfRange,
    InvalidTransition,
    AlreadyClaimed,
    InsufficientBalance,
    Validation,
    NotFound,
    Store,
}

impl ErrorKind {
    /// Stable snake_case code for rendering feedback in the calling layer.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidDistribution => "invalid_distribution",
            ErrorKind::InvalidRewardRange => "invalid_reward_range",
            ErrorKind::RewardOutOfRange => "reward_out_of_range",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::AlreadyClaimed => "already_claimed",
            ErrorKind::InsufficientBalance => "insufficient_balance",
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Store => "store_error",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidDistribution(_) => ErrorKind::InvalidDistribution,
            Error::InvalidRewardRange { .. } => ErrorKind::InvalidRewardRange,
            Error::RewardOutOfRange { .. } => ErrorKind::RewardOutOfRange,
            Error::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Error::AlreadyClaimed { .. } => ErrorKind::AlreadyClaimed,
            Error::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Store(_) => ErrorKind::Store,
        }
    }

    /// Lost claims and stale transitions are normal control flow, not faults.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Error::AlreadyClaimed { .. } | Error::InvalidTransition { .. }
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyClaimed(chore_id) => Error::AlreadyClaimed { chore_id },
            StoreError::PreconditionFailed { id, actual, .. } => Error::InvalidTransition {
                assignment_id: id,
                state: actual,
                action: "update",
            },
            StoreError::NotFound { entity, id } => Error::NotFound { entity, id },
            StoreError::AlreadyExists { chore_id, child_id } => Error::InvalidDistribution(
                format!("child {child_id} is already assigned to chore {chore_id}"),
            ),
            other => Error::Store(other),
        }
    }
}

// --- Bounded context errors ---

/// Errors surfaced by a [`crate::ChoreRepository`] implementation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Assignment already exists for chore {chore_id} and child {child_id}")]
    AlreadyExists { chore_id: ChoreId, child_id: ChildId },

    #[error("Pool chore {0} already has an assignment")]
    AlreadyClaimed(ChoreId),

    #[error("Assignment {id} is {actual}, expected {expected}")]
    PreconditionFailed {
        id: AssignmentId,
        expected: AssignmentState,
        actual: AssignmentState,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Storage backend failure: {0}")]
    Backend(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Errors from an [`crate::ActivitySink`]. The engine logs and drops these.
#[derive(Debug, Clone, Error)]
pub enum ActivityError {
    #[error("Activity sink unavailable: {0}")]
    Unavailable(String),

    #[error("Activity event rejected: {0}")]
    Rejected(String),
}
