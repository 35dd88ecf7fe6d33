//! Claim coordinator — first child to finish a pool chore wins.
//!
//! The winner is decided by exactly one repository call,
//! [`ChoreRepository::claim_if_unassigned`]. The coordinator never reads
//! and then writes to decide a claim.

use chrono::{DateTime, Utc};
use choreboard_core::{Assignment, ChildId, Chore, ChoreRepository, Error, Result, StoreError};
use std::sync::Arc;
use tracing::debug;

use crate::recurrence::RecurrencePolicy;

pub struct ClaimCoordinator {
    repo: Arc<dyn ChoreRepository>,
    recurrence: RecurrencePolicy,
}

impl ClaimCoordinator {
    pub fn new(repo: Arc<dyn ChoreRepository>, recurrence: RecurrencePolicy) -> Self {
        Self { repo, recurrence }
    }

    /// Delete approved pool rows whose cooldown has elapsed, returning the
    /// chore to the unclaimed pool. Returns the rows actually deleted.
    ///
    /// Racing deleters are harmless: each row id is deleted at most once
    /// and the next claim is still arbitrated by the atomic insert.
    pub async fn return_due(&self, chore: &Chore, now: DateTime<Utc>) -> Result<Vec<Assignment>> {
        let mut returned = Vec::new();
        for row in self.repo.list_assignments_for_chore(&chore.id).await? {
            if self.recurrence.is_due(chore, &row, now) && self.repo.delete_assignment(&row.id).await? {
                debug!(chore_id = %chore.id, assignment_id = %row.id, "Pool chore returned to pool");
                returned.push(row);
            }
        }
        Ok(returned)
    }

    /// Claim `chore` for `child_id`. The new row is born `Completed`: for a
    /// pool chore, claiming is the act of reporting it done.
    pub async fn claim(
        &self,
        chore: &Chore,
        child_id: &ChildId,
        now: DateTime<Utc>,
    ) -> Result<Assignment> {
        if !chore.is_pool() {
            return Err(Error::InvalidDistribution(format!(
                "chore {} is {}, only pool chores can be claimed",
                chore.id, chore.distribution
            )));
        }

        match self.repo.claim_if_unassigned(&chore.id, child_id, now).await {
            Ok(row) => Ok(row),
            Err(StoreError::AlreadyClaimed(_)) => {
                debug!(chore_id = %chore.id, child_id = %child_id, "Claim lost");
                Err(Error::AlreadyClaimed { chore_id: chore.id })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use choreboard_core::{
        AssignmentState, DistributionMode, ErrorKind, FamilyId, Money, NewChore, ParentId,
        Recurrence, RewardTerms, StateTransition,
    };
    use choreboard_store::InMemoryStore;

    async fn setup(mode: DistributionMode) -> (Arc<InMemoryStore>, ClaimCoordinator, Chore) {
        let store = Arc::new(InMemoryStore::new());
        let coordinator = ClaimCoordinator::new(store.clone(), RecurrencePolicy::utc());
        let chore = store
            .create_chore(Chore::from_new(
                NewChore {
                    family_id: FamilyId::new(),
                    parent_id: ParentId::new(),
                    title: "Mow the lawn".into(),
                    description: String::new(),
                    reward: RewardTerms::fixed(Money::from_cents(500)),
                    distribution: mode,
                    recurrence: Recurrence::every_days(3),
                },
                Utc::now(),
            ))
            .await
            .unwrap();
        (store, coordinator, chore)
    }

    #[tokio::test]
    async fn first_claim_wins_second_loses() {
        let (_store, coordinator, chore) = setup(DistributionMode::Pool).await;
        let won = coordinator.claim(&chore, &ChildId::new(), Utc::now()).await.unwrap();
        assert_eq!(won.state, AssignmentState::Completed);

        let err = coordinator.claim(&chore, &ChildId::new(), Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyClaimed);
    }

    #[tokio::test]
    async fn non_pool_chore_cannot_be_claimed() {
        let (_store, coordinator, chore) = setup(DistributionMode::Single).await;
        let err = coordinator.claim(&chore, &ChildId::new(), Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDistribution);
    }

    #[tokio::test]
    async fn return_due_only_deletes_elapsed_rows() {
        let (store, coordinator, chore) = setup(DistributionMode::Pool).await;
        let t = Utc::now();
        let row = coordinator.claim(&chore, &ChildId::new(), t).await.unwrap();
        store
            .update_assignment_state(
                &row.id,
                AssignmentState::Completed,
                StateTransition::approved(row.completed_at, t, Money::from_cents(500)),
                t,
            )
            .await
            .unwrap();

        assert!(coordinator.return_due(&chore, t + Duration::days(2)).await.unwrap().is_empty());
        let returned = coordinator.return_due(&chore, t + Duration::days(3)).await.unwrap();
        assert_eq!(returned.len(), 1);
        assert_eq!(store.assignment_count().await, 0);
    }
}
