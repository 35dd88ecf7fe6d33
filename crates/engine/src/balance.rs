//! Balance aggregator — a child's balance, derived on every read.
//!
//! There is no cached balance column. The total is the sum of approved
//! payouts, including those of rows that have since been reset or returned
//! to the pool, plus the adjustment ledger.

use choreboard_core::{Balance, ChildId, ChoreRepository, Error, Money, Result, StoreError};
use std::sync::Arc;

pub struct BalanceAggregator {
    repo: Arc<dyn ChoreRepository>,
}

impl BalanceAggregator {
    pub fn new(repo: Arc<dyn ChoreRepository>) -> Self {
        Self { repo }
    }

    /// Total the child's approved rows, archived payouts and adjustments,
    /// all taken from one repository snapshot.
    pub async fn balance(&self, child_id: &ChildId) -> Result<Balance> {
        let sources = self.repo.balance_sources_for_child(child_id).await?;
        Balance::from_sources(*child_id, &sources).ok_or_else(|| {
            Error::Store(StoreError::Corrupt(format!(
                "balance for child {child_id} overflows"
            )))
        })
    }

    /// Refuse a negative adjustment that would take the balance below zero.
    ///
    /// The check reads the balance and the caller writes the adjustment
    /// afterwards, so two concurrent deductions can both pass. Deductions
    /// are parent-initiated and rare enough that this is accepted.
    pub async fn check_adjustment(&self, child_id: &ChildId, amount: Money) -> Result<Balance> {
        let balance = self.balance(child_id).await?;
        if amount.is_negative() {
            let after = balance
                .total
                .checked_add(amount)
                .ok_or_else(|| Error::validation("adjustment amount out of range"))?;
            if after.is_negative() {
                return Err(Error::InsufficientBalance {
                    balance: balance.total,
                    amount,
                });
            }
        }
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use choreboard_core::{
        Adjustment, Assignment, AssignmentId, AssignmentState, BalanceSources, Chore, ChoreId,
        DistributionMode, ErrorKind, FamilyId, NewAdjustment, NewChore, ParentId, Payout,
        Recurrence, RewardTerms, StateTransition,
    };
    use choreboard_store::InMemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Resets one approved row right after the first balance read returns,
    /// the way a concurrent refresh would land between two reads.
    struct ResetAfterFirstRead {
        inner: InMemoryStore,
        row: AssignmentId,
        done: AtomicBool,
    }

    impl ResetAfterFirstRead {
        async fn reset_once(&self) {
            if !self.done.swap(true, Ordering::SeqCst) {
                self.inner
                    .update_assignment_state(
                        &self.row,
                        AssignmentState::Approved,
                        StateTransition::pending(),
                        Utc::now(),
                    )
                    .await
                    .unwrap();
            }
        }
    }

    #[async_trait]
    impl ChoreRepository for ResetAfterFirstRead {
        fn name(&self) -> &str {
            "reset_after_first_read"
        }

        async fn create_chore(&self, chore: Chore) -> std::result::Result<Chore, StoreError> {
            self.inner.create_chore(chore).await
        }

        async fn create_chore_with_assignments(
            &self,
            chore: Chore,
            children: &[ChildId],
            initial_state: AssignmentState,
            now: DateTime<Utc>,
        ) -> std::result::Result<(Chore, Vec<Assignment>), StoreError> {
            self.inner
                .create_chore_with_assignments(chore, children, initial_state, now)
                .await
        }

        async fn get_chore(&self, id: &ChoreId) -> std::result::Result<Option<Chore>, StoreError> {
            self.inner.get_chore(id).await
        }

        async fn create_assignment(
            &self,
            chore_id: &ChoreId,
            child_id: &ChildId,
            initial_state: AssignmentState,
            now: DateTime<Utc>,
        ) -> std::result::Result<Assignment, StoreError> {
            self.inner
                .create_assignment(chore_id, child_id, initial_state, now)
                .await
        }

        async fn claim_if_unassigned(
            &self,
            chore_id: &ChoreId,
            child_id: &ChildId,
            now: DateTime<Utc>,
        ) -> std::result::Result<Assignment, StoreError> {
            self.inner.claim_if_unassigned(chore_id, child_id, now).await
        }

        async fn get_assignment(
            &self,
            id: &AssignmentId,
        ) -> std::result::Result<Option<Assignment>, StoreError> {
            self.inner.get_assignment(id).await
        }

        async fn update_assignment_state(
            &self,
            id: &AssignmentId,
            expected: AssignmentState,
            transition: StateTransition,
            now: DateTime<Utc>,
        ) -> std::result::Result<Assignment, StoreError> {
            self.inner
                .update_assignment_state(id, expected, transition, now)
                .await
        }

        async fn delete_assignment(&self, id: &AssignmentId) -> std::result::Result<bool, StoreError> {
            self.inner.delete_assignment(id).await
        }

        async fn list_assignments_for_chore(
            &self,
            chore_id: &ChoreId,
        ) -> std::result::Result<Vec<Assignment>, StoreError> {
            self.inner.list_assignments_for_chore(chore_id).await
        }

        async fn list_assignments_for_child(
            &self,
            child_id: &ChildId,
        ) -> std::result::Result<Vec<Assignment>, StoreError> {
            let rows = self.inner.list_assignments_for_child(child_id).await;
            self.reset_once().await;
            rows
        }

        async fn balance_sources_for_child(
            &self,
            child_id: &ChildId,
        ) -> std::result::Result<BalanceSources, StoreError> {
            let sources = self.inner.balance_sources_for_child(child_id).await;
            self.reset_once().await;
            sources
        }

        async fn list_payouts_for_child(
            &self,
            child_id: &ChildId,
        ) -> std::result::Result<Vec<Payout>, StoreError> {
            let payouts = self.inner.list_payouts_for_child(child_id).await;
            self.reset_once().await;
            payouts
        }

        async fn list_adjustments_for_child(
            &self,
            child_id: &ChildId,
        ) -> std::result::Result<Vec<Adjustment>, StoreError> {
            self.inner.list_adjustments_for_child(child_id).await
        }

        async fn create_adjustment(
            &self,
            adjustment: NewAdjustment,
            now: DateTime<Utc>,
        ) -> std::result::Result<Adjustment, StoreError> {
            self.inner.create_adjustment(adjustment, now).await
        }
    }

    async fn credit(store: &InMemoryStore, child: ChildId, cents: i64) {
        store
            .create_adjustment(
                NewAdjustment {
                    child_id: child,
                    parent_id: ParentId::new(),
                    amount: Money::from_cents(cents),
                    reason: "seed".into(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_balance_is_zero() {
        let agg = BalanceAggregator::new(Arc::new(InMemoryStore::new()));
        let b = agg.balance(&ChildId::new()).await.unwrap();
        assert_eq!(b.total, Money::ZERO);
    }

    #[tokio::test]
    async fn deduction_to_exactly_zero_is_allowed() {
        let store = Arc::new(InMemoryStore::new());
        let child = ChildId::new();
        credit(&store, child, 1000).await;
        let agg = BalanceAggregator::new(store);

        let err = agg
            .check_adjustment(&child, Money::from_cents(-1001))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert!(agg.check_adjustment(&child, Money::from_cents(-1000)).await.is_ok());
    }

    #[tokio::test]
    async fn positive_adjustment_always_passes() {
        let agg = BalanceAggregator::new(Arc::new(InMemoryStore::new()));
        let b = agg
            .check_adjustment(&ChildId::new(), Money::from_cents(500))
            .await
            .unwrap();
        assert_eq!(b.total, Money::ZERO);
    }

    #[tokio::test]
    async fn only_approved_rows_count_as_earned() {
        let store = Arc::new(InMemoryStore::new());
        let child = ChildId::new();
        let chore = store.create_chore(test_chore()).await.unwrap();
        let row = store
            .create_assignment(&chore.id, &child, AssignmentState::Completed, Utc::now())
            .await
            .unwrap();
        let agg = BalanceAggregator::new(store.clone());
        assert_eq!(agg.balance(&child).await.unwrap().earned, Money::ZERO);

        store
            .update_assignment_state(
                &row.id,
                AssignmentState::Completed,
                StateTransition::approved(row.completed_at, Utc::now(), Money::from_cents(250)),
                Utc::now(),
            )
            .await
            .unwrap();
        credit(&store, child, -50).await;

        let b = agg.balance(&child).await.unwrap();
        assert_eq!(b.earned, Money::from_cents(250));
        assert_eq!(b.adjustments, Money::from_cents(-50));
        assert_eq!(b.total, Money::from_cents(200));
    }

    #[tokio::test]
    async fn reset_rows_keep_their_payout() {
        let store = Arc::new(InMemoryStore::new());
        let child = ChildId::new();
        let chore = store.create_chore(test_chore()).await.unwrap();
        let now = Utc::now();
        let row = store
            .create_assignment(&chore.id, &child, AssignmentState::Completed, now)
            .await
            .unwrap();
        store
            .update_assignment_state(
                &row.id,
                AssignmentState::Completed,
                StateTransition::approved(row.completed_at, now, Money::from_cents(250)),
                now,
            )
            .await
            .unwrap();
        store
            .update_assignment_state(&row.id, AssignmentState::Approved, StateTransition::pending(), now)
            .await
            .unwrap();

        let agg = BalanceAggregator::new(store);
        assert_eq!(agg.balance(&child).await.unwrap().earned, Money::from_cents(250));
    }

    #[tokio::test]
    async fn reset_between_reads_is_counted_once() {
        let store = InMemoryStore::new();
        let child = ChildId::new();
        let chore = store.create_chore(test_chore()).await.unwrap();
        let now = Utc::now();
        let row = store
            .create_assignment(&chore.id, &child, AssignmentState::Completed, now)
            .await
            .unwrap();
        store
            .update_assignment_state(
                &row.id,
                AssignmentState::Completed,
                StateTransition::approved(row.completed_at, now, Money::from_cents(1000)),
                now,
            )
            .await
            .unwrap();

        let repo = Arc::new(ResetAfterFirstRead {
            inner: store.clone(),
            row: row.id,
            done: AtomicBool::new(false),
        });
        let agg = BalanceAggregator::new(repo.clone());

        assert_eq!(agg.balance(&child).await.unwrap().total, Money::from_cents(1000));
        assert!(repo.done.load(Ordering::SeqCst));
        let after = store.get_assignment(&row.id).await.unwrap().unwrap();
        assert_eq!(after.state, AssignmentState::Pending);
        assert_eq!(agg.balance(&child).await.unwrap().total, Money::from_cents(1000));
    }

    #[tokio::test]
    async fn overflowing_ledger_is_a_store_error() {
        let store = Arc::new(InMemoryStore::new());
        let child = ChildId::new();
        let big = i64::MAX / 2 + 1;
        credit(&store, child, big).await;
        credit(&store, child, big).await;

        let err = BalanceAggregator::new(store)
            .balance(&child)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Store);
    }

    fn test_chore() -> Chore {
        Chore::from_new(
            NewChore {
                family_id: FamilyId::new(),
                parent_id: ParentId::new(),
                title: "Feed the cat".into(),
                description: String::new(),
                reward: RewardTerms::fixed(Money::from_cents(250)),
                distribution: DistributionMode::Single,
                recurrence: Recurrence::None,
            },
            Utc::now(),
        )
    }
}
