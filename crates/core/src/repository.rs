//! Repository trait — durable storage for chores, assignments and adjustments.
//!
//! The engine holds no locks of its own. Every cross-request safety
//! guarantee comes from the atomic primitives below, so implementations
//! must execute each method as a single indivisible operation.
//!
//! Whenever a row leaves `Approved`, through [`ChoreRepository::update_assignment_state`]
//! or [`ChoreRepository::delete_assignment`], the implementation records its
//! [`Payout`] in the same operation.

use crate::adjustment::{Adjustment, BalanceSources, NewAdjustment};
use crate::assignment::{Assignment, AssignmentState, Payout, StateTransition};
use crate::chore::Chore;
use crate::error::StoreError;
use crate::id::{AssignmentId, ChildId, ChoreId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The core ChoreRepository trait.
///
/// Implementations: SQLite (sqlx), in-memory (for testing).
#[async_trait]
pub trait ChoreRepository: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Persist a new chore definition.
    async fn create_chore(&self, chore: Chore) -> Result<Chore, StoreError>;

    /// Persist a chore and one row per child, all or nothing.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if `children` repeats a
    /// child; nothing is written in that case.
    async fn create_chore_with_assignments(
        &self,
        chore: Chore,
        children: &[ChildId],
        initial_state: AssignmentState,
        now: DateTime<Utc>,
    ) -> Result<(Chore, Vec<Assignment>), StoreError>;

    /// Get a chore by ID.
    async fn get_chore(&self, id: &ChoreId) -> Result<Option<Chore>, StoreError>;

    /// Insert an assignment for `(chore_id, child_id)`.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if that pair already has a row.
    async fn create_assignment(
        &self,
        chore_id: &ChoreId,
        child_id: &ChildId,
        initial_state: AssignmentState,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError>;

    /// Insert a `Completed` assignment iff the chore has no assignment at all.
    ///
    /// This is one atomic conditional insert. Fails with
    /// [`StoreError::AlreadyClaimed`] when any row exists for the chore.
    async fn claim_if_unassigned(
        &self,
        chore_id: &ChoreId,
        child_id: &ChildId,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError>;

    /// Get an assignment by ID.
    async fn get_assignment(&self, id: &AssignmentId) -> Result<Option<Assignment>, StoreError>;

    /// Compare-and-swap on the assignment state.
    ///
    /// Applies `transition` only if the row is currently in `expected`;
    /// otherwise fails with [`StoreError::PreconditionFailed`] carrying the
    /// state that was actually found.
    async fn update_assignment_state(
        &self,
        id: &AssignmentId,
        expected: AssignmentState,
        transition: StateTransition,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError>;

    /// Delete an assignment, keeping its payout if it was approved.
    /// Returns `false` if it was already gone.
    async fn delete_assignment(&self, id: &AssignmentId) -> Result<bool, StoreError>;

    async fn list_assignments_for_chore(
        &self,
        chore_id: &ChoreId,
    ) -> Result<Vec<Assignment>, StoreError>;

    async fn list_assignments_for_child(
        &self,
        child_id: &ChildId,
    ) -> Result<Vec<Assignment>, StoreError>;

    /// The child's approved rows, archived payouts and adjustments, read
    /// as one snapshot that no concurrent reset or delete can split.
    async fn balance_sources_for_child(
        &self,
        child_id: &ChildId,
    ) -> Result<BalanceSources, StoreError>;

    /// Payouts of approved rows that have since been reset or deleted.
    async fn list_payouts_for_child(&self, child_id: &ChildId) -> Result<Vec<Payout>, StoreError>;

    async fn list_adjustments_for_child(
        &self,
        child_id: &ChildId,
    ) -> Result<Vec<Adjustment>, StoreError>;

    /// Append an adjustment to the ledger.
    async fn create_adjustment(
        &self,
        adjustment: NewAdjustment,
        now: DateTime<Utc>,
    ) -> Result<Adjustment, StoreError>;
}
