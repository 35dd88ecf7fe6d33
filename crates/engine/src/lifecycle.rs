//! Assignment lifecycle engine — the caller-facing operations.
//!
//! Every state change is a conditional update keyed on the state the
//! engine expects, so two requests racing on the same assignment cannot
//! both succeed. Activity emission happens after the write and is never
//! allowed to undo it.

use chrono::{DateTime, Utc};
use choreboard_config::EngineConfig;
use choreboard_core::{
    ActivityEvent, ActivityKind, ActivitySink, Actor, Adjustment, Assignment, AssignmentId,
    AssignmentState, Balance, ChildId, Chore, ChoreId, ChoreRepository, Clock, DistributionMode,
    Error, Money, NewAdjustment, NewChore, ParentId, Result, StateTransition, StoreError,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::balance::BalanceAggregator;
use crate::claim::ClaimCoordinator;
use crate::recurrence::RecurrencePolicy;
use crate::reward::RewardPolicy;

/// A newly created chore together with its initial assignments.
#[derive(Debug, Clone)]
pub struct ChoreCreated {
    pub chore: Chore,
    /// Empty for pool chores.
    pub assignments: Vec<Assignment>,
}

/// What a [`ChoreEngine::refresh_if_due`] call changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Approved rows reset to `Pending`.
    pub reset: usize,
    /// Approved pool rows deleted.
    pub returned_to_pool: usize,
}

impl RefreshSummary {
    pub fn is_empty(&self) -> bool {
        self.reset == 0 && self.returned_to_pool == 0
    }
}

/// The chore assignment and reward lifecycle engine.
///
/// Stateless between calls; all shared state lives behind the repository.
/// No operation performs authorization. The caller resolves which parent
/// and child are acting before calling in.
pub struct ChoreEngine {
    repo: Arc<dyn ChoreRepository>,
    activity: Arc<dyn ActivitySink>,
    clock: Arc<dyn Clock>,
    rewards: RewardPolicy,
    recurrence: RecurrencePolicy,
    claims: ClaimCoordinator,
    balances: BalanceAggregator,
    max_title_len: usize,
    max_reason_len: usize,
    max_adjustment: Money,
}

impl ChoreEngine {
    pub fn new(
        repo: Arc<dyn ChoreRepository>,
        activity: Arc<dyn ActivitySink>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let zone = config
            .time_zone()
            .map_err(|e| Error::validation(e.to_string()))?;
        let recurrence = RecurrencePolicy::new(zone);
        Ok(Self {
            claims: ClaimCoordinator::new(repo.clone(), recurrence),
            balances: BalanceAggregator::new(repo.clone()),
            rewards: RewardPolicy::new(config.max_reward()),
            recurrence,
            repo,
            activity,
            clock,
            max_title_len: config.max_title_len,
            max_reason_len: config.max_reason_len,
            max_adjustment: config.max_adjustment(),
        })
    }

    pub fn recurrence(&self) -> &RecurrencePolicy {
        &self.recurrence
    }

    /// Persist a chore and the assignments its distribution mode calls for.
    ///
    /// `Single` takes exactly one child, `MultiIndependent` one or more,
    /// `Pool` none. Each named child gets one `Pending` row.
    pub async fn create_chore_assignments(
        &self,
        new: NewChore,
        children: &[ChildId],
    ) -> Result<ChoreCreated> {
        self.check_title(&new.title)?;
        self.rewards.validate_terms(&new.reward)?;
        self.recurrence.validate(&new.recurrence)?;
        check_distribution(new.distribution, children)?;

        let now = self.clock.now();
        let (chore, assignments) = self
            .repo
            .create_chore_with_assignments(
                Chore::from_new(new, now),
                children,
                AssignmentState::Pending,
                now,
            )
            .await?;
        info!(
            chore_id = %chore.id,
            distribution = %chore.distribution,
            reward = %chore.reward,
            children = children.len(),
            "Chore created"
        );
        self.record(
            ActivityEvent::new(ActivityKind::ChoreCreated, Actor::Parent(chore.parent_id), now)
                .chore(chore.id)
                .details(chore.title.clone()),
        )
        .await;

        for row in &assignments {
            self.record(
                ActivityEvent::new(
                    ActivityKind::AssignmentCreated,
                    Actor::Parent(chore.parent_id),
                    now,
                )
                .chore(chore.id)
                .assignment(row.id)
                .child(row.child_id),
            )
            .await;
        }

        Ok(ChoreCreated { chore, assignments })
    }

    /// The child reports the assignment done.
    ///
    /// A `Rejected` row is reopened first. An `Approved` row of a recurring
    /// non-pool chore is reset first once its cooldown has elapsed. Pool
    /// rows are never reset here; the chore has to be claimed again.
    pub async fn complete_assignment(&self, id: &AssignmentId) -> Result<Assignment> {
        let now = self.clock.now();
        let mut row = self.load_assignment(id).await?;
        let chore = self.load_chore(&row.chore_id).await?;

        match row.state {
            AssignmentState::Pending => {}
            AssignmentState::Rejected => {
                row = self
                    .transition(&row, AssignmentState::Rejected, StateTransition::pending(), "complete", now)
                    .await?;
                self.record(
                    self.event(ActivityKind::Reopened, Actor::Child(row.child_id), &row, now),
                )
                .await;
            }
            AssignmentState::Approved if !chore.is_pool() && self.recurrence.is_due(&chore, &row, now) => {
                row = self
                    .transition(&row, AssignmentState::Approved, StateTransition::pending(), "complete", now)
                    .await?;
                info!(assignment_id = %row.id, chore_id = %chore.id, "Recurring assignment reset");
                self.record(self.event(ActivityKind::Reset, Actor::System, &row, now))
                    .await;
            }
            state => {
                return Err(Error::InvalidTransition {
                    assignment_id: row.id,
                    state,
                    action: "complete",
                });
            }
        }

        let row = self
            .transition(
                &row,
                AssignmentState::Pending,
                StateTransition::completed(now),
                "complete",
                now,
            )
            .await?;
        info!(assignment_id = %row.id, child_id = %row.child_id, "Assignment completed");
        self.record(self.event(ActivityKind::Completed, Actor::Child(row.child_id), &row, now))
            .await;
        Ok(row)
    }

    /// The parent approves a completed assignment and the reward is fixed.
    ///
    /// `amount` is required for range rewards and optional for fixed ones.
    /// Approving an already approved row is an `InvalidTransition`, so a
    /// retried approval never credits twice.
    pub async fn approve_assignment(
        &self,
        id: &AssignmentId,
        parent_id: ParentId,
        amount: Option<Money>,
    ) -> Result<Assignment> {
        let now = self.clock.now();
        let row = self.load_assignment(id).await?;
        expect_state(&row, AssignmentState::Completed, "approve")?;
        let chore = self.load_chore(&row.chore_id).await?;
        let payable = self.rewards.resolve(&chore.reward, amount)?;

        let row = self
            .transition(
                &row,
                AssignmentState::Completed,
                StateTransition::approved(row.completed_at, now, payable),
                "approve",
                now,
            )
            .await?;
        info!(
            assignment_id = %row.id,
            child_id = %row.child_id,
            amount = %payable,
            "Assignment approved"
        );
        self.record(
            self.event(ActivityKind::Approved, Actor::Parent(parent_id), &row, now)
                .details(payable.to_string()),
        )
        .await;
        Ok(row)
    }

    /// The parent sends a completed assignment back with a reason.
    pub async fn reject_assignment(
        &self,
        id: &AssignmentId,
        parent_id: ParentId,
        reason: &str,
    ) -> Result<Assignment> {
        let reason = self.check_reason(reason, "rejection reason")?;
        let now = self.clock.now();
        let row = self.load_assignment(id).await?;
        expect_state(&row, AssignmentState::Completed, "reject")?;

        let row = self
            .transition(
                &row,
                AssignmentState::Completed,
                StateTransition::rejected(row.completed_at, reason),
                "reject",
                now,
            )
            .await?;
        info!(assignment_id = %row.id, child_id = %row.child_id, "Assignment rejected");
        self.record(
            self.event(ActivityKind::Rejected, Actor::Parent(parent_id), &row, now)
                .details(reason),
        )
        .await;
        Ok(row)
    }

    /// Claim a pool chore by completing it. Exactly one concurrent claimant
    /// wins; the rest get `AlreadyClaimed`.
    pub async fn claim_pool_chore(&self, chore_id: &ChoreId, child_id: &ChildId) -> Result<Assignment> {
        let now = self.clock.now();
        let chore = self.load_chore(chore_id).await?;
        if chore.is_pool() {
            self.return_to_pool(&chore, now).await?;
        }

        let row = self.claims.claim(&chore, child_id, now).await?;
        info!(chore_id = %chore.id, child_id = %child_id, assignment_id = %row.id, "Pool chore claimed");
        self.record(self.event(ActivityKind::Claimed, Actor::Child(*child_id), &row, now))
            .await;
        Ok(row)
    }

    pub async fn compute_balance(&self, child_id: &ChildId) -> Result<Balance> {
        let balance = self.balances.balance(child_id).await?;
        debug!(child_id = %child_id, total = %balance.total, "Balance computed");
        Ok(balance)
    }

    /// Record a manual balance change.
    ///
    /// Negative amounts are checked against the current balance first. The
    /// check and the insert are separate repository calls, so concurrent
    /// deductions for the same child can still overdraw it.
    pub async fn create_adjustment(&self, new: NewAdjustment) -> Result<Adjustment> {
        if new.amount.is_zero() {
            return Err(Error::validation("adjustment amount must be nonzero"));
        }
        if new.amount.unsigned_cents() > self.max_adjustment.unsigned_cents() {
            return Err(Error::validation(format!(
                "adjustment amount {} exceeds the limit of {}",
                new.amount, self.max_adjustment
            )));
        }
        self.check_reason(&new.reason, "adjustment reason")?;
        self.balances.check_adjustment(&new.child_id, new.amount).await?;

        let now = self.clock.now();
        let adjustment = self.repo.create_adjustment(new, now).await?;
        info!(
            adjustment_id = %adjustment.id,
            child_id = %adjustment.child_id,
            amount = %adjustment.amount,
            "Adjustment recorded"
        );
        self.record(
            ActivityEvent::new(
                ActivityKind::AdjustmentRecorded,
                Actor::Parent(adjustment.parent_id),
                now,
            )
            .child(adjustment.child_id)
            .details(format!("{}: {}", adjustment.amount, adjustment.reason)),
        )
        .await;
        Ok(adjustment)
    }

    /// Whether `child_id` can act on the chore right now. Read-only.
    ///
    /// For a pool chore the child is irrelevant: the answer is whether the
    /// chore can be claimed. Otherwise it is whether the child's own
    /// assignment can be completed.
    pub async fn is_available(&self, chore_id: &ChoreId, child_id: &ChildId) -> Result<bool> {
        let now = self.clock.now();
        let chore = self.load_chore(chore_id).await?;
        let rows = self.repo.list_assignments_for_chore(chore_id).await?;

        let available = if chore.is_pool() {
            self.recurrence.is_available(&chore, rows.first(), now)
        } else {
            let row = rows
                .iter()
                .find(|a| a.child_id == *child_id)
                .ok_or_else(|| Error::not_found("assignment", format!("{chore_id}/{child_id}")))?;
            self.recurrence.is_available(&chore, Some(row), now)
        };
        debug!(chore_id = %chore_id, child_id = %child_id, available, "Availability checked");
        Ok(available)
    }

    /// Apply any due recurrence reset for the chore: approved rows past
    /// their cooldown go back to `Pending`, or are deleted for pool chores.
    pub async fn refresh_if_due(&self, chore_id: &ChoreId) -> Result<RefreshSummary> {
        let now = self.clock.now();
        let chore = self.load_chore(chore_id).await?;
        let mut summary = RefreshSummary::default();
        if !chore.recurrence.is_recurring() {
            return Ok(summary);
        }

        if chore.is_pool() {
            summary.returned_to_pool = self.return_to_pool(&chore, now).await?;
            return Ok(summary);
        }

        for row in self.repo.list_assignments_for_chore(chore_id).await? {
            if !self.recurrence.is_due(&chore, &row, now) {
                continue;
            }
            match self
                .repo
                .update_assignment_state(&row.id, AssignmentState::Approved, StateTransition::pending(), now)
                .await
            {
                Ok(reset) => {
                    info!(assignment_id = %reset.id, chore_id = %chore.id, "Recurring assignment reset");
                    self.record(self.event(ActivityKind::Reset, Actor::System, &reset, now))
                        .await;
                    summary.reset += 1;
                }
                // Someone else reset or completed it first.
                Err(StoreError::PreconditionFailed { .. }) => {
                    debug!(assignment_id = %row.id, "Reset skipped, row already moved on");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(summary)
    }

    pub async fn get_chore(&self, id: &ChoreId) -> Result<Chore> {
        self.load_chore(id).await
    }

    pub async fn get_assignment(&self, id: &AssignmentId) -> Result<Assignment> {
        self.load_assignment(id).await
    }

    pub async fn assignments_for_chore(&self, chore_id: &ChoreId) -> Result<Vec<Assignment>> {
        self.load_chore(chore_id).await?;
        Ok(self.repo.list_assignments_for_chore(chore_id).await?)
    }

    pub async fn assignments_for_child(&self, child_id: &ChildId) -> Result<Vec<Assignment>> {
        Ok(self.repo.list_assignments_for_child(child_id).await?)
    }

    // --- internals ---

    async fn load_chore(&self, id: &ChoreId) -> Result<Chore> {
        self.repo
            .get_chore(id)
            .await?
            .ok_or_else(|| Error::not_found("chore", id))
    }

    async fn load_assignment(&self, id: &AssignmentId) -> Result<Assignment> {
        self.repo
            .get_assignment(id)
            .await?
            .ok_or_else(|| Error::not_found("assignment", id))
    }

    async fn return_to_pool(&self, chore: &Chore, now: DateTime<Utc>) -> Result<usize> {
        let returned = self.claims.return_due(chore, now).await?;
        for row in &returned {
            info!(chore_id = %chore.id, assignment_id = %row.id, "Pool chore returned to pool");
            self.record(self.event(ActivityKind::ReturnedToPool, Actor::System, row, now))
                .await;
        }
        Ok(returned.len())
    }

    /// Conditional update that reports a lost race as `InvalidTransition`.
    async fn transition(
        &self,
        row: &Assignment,
        expected: AssignmentState,
        transition: StateTransition,
        action: &'static str,
        now: DateTime<Utc>,
    ) -> Result<Assignment> {
        self.repo
            .update_assignment_state(&row.id, expected, transition, now)
            .await
            .map_err(|e| match e {
                StoreError::PreconditionFailed { id, actual, .. } => Error::InvalidTransition {
                    assignment_id: id,
                    state: actual,
                    action,
                },
                other => other.into(),
            })
    }

    fn event(
        &self,
        kind: ActivityKind,
        actor: Actor,
        row: &Assignment,
        now: DateTime<Utc>,
    ) -> ActivityEvent {
        ActivityEvent::new(kind, actor, now)
            .chore(row.chore_id)
            .assignment(row.id)
            .child(row.child_id)
    }

    async fn record(&self, event: ActivityEvent) {
        let kind = event.kind;
        if let Err(e) = self.activity.emit(event).await {
            warn!(kind = ?kind, error = %e, "Failed to record activity");
        }
    }

    fn check_title(&self, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::validation("chore title cannot be empty"));
        }
        if title.chars().count() > self.max_title_len {
            return Err(Error::validation(format!(
                "chore title is longer than {} characters",
                self.max_title_len
            )));
        }
        Ok(())
    }

    fn check_reason<'a>(&self, reason: &'a str, what: &str) -> Result<&'a str> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(Error::validation(format!("{what} cannot be empty")));
        }
        if reason.chars().count() > self.max_reason_len {
            return Err(Error::validation(format!(
                "{what} is longer than {} characters",
                self.max_reason_len
            )));
        }
        Ok(reason)
    }
}

fn expect_state(row: &Assignment, expected: AssignmentState, action: &'static str) -> Result<()> {
    if row.state != expected {
        return Err(Error::InvalidTransition {
            assignment_id: row.id,
            state: row.state,
            action,
        });
    }
    Ok(())
}

fn check_distribution(mode: DistributionMode, children: &[ChildId]) -> Result<()> {
    let mut seen = HashSet::with_capacity(children.len());
    if let Some(dup) = children.iter().find(|c| !seen.insert(**c)) {
        return Err(Error::InvalidDistribution(format!(
            "child {dup} is listed more than once"
        )));
    }

    match (mode, children.len()) {
        (DistributionMode::Single, 1) | (DistributionMode::Pool, 0) => Ok(()),
        (DistributionMode::MultiIndependent, n) if n > 0 => Ok(()),
        (DistributionMode::Single, n) => Err(Error::InvalidDistribution(format!(
            "a single chore needs exactly one child, got {n}"
        ))),
        (DistributionMode::MultiIndependent, _) => Err(Error::InvalidDistribution(
            "a multi_independent chore needs at least one child".into(),
        )),
        (DistributionMode::Pool, n) => Err(Error::InvalidDistribution(format!(
            "a pool chore is not assigned up front, got {n} children"
        ))),
    }
}
