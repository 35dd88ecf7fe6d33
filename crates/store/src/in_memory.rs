//! In-memory backend — useful for testing and ephemeral sessions.
//!
//! All tables sit behind one `RwLock`, so every trait method runs under a
//! single guard and the conditional operations are linearizable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use choreboard_core::error::StoreError;
use choreboard_core::{
    Adjustment, Assignment, AssignmentId, AssignmentState, BalanceSources, ChildId, Chore,
    ChoreId, ChoreRepository, NewAdjustment, Payout, StateTransition,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    chores: HashMap<ChoreId, Chore>,
    assignments: HashMap<AssignmentId, Assignment>,
    adjustments: Vec<Adjustment>,
    payouts: Vec<Payout>,
}

impl Tables {
    fn require_chore(&self, chore_id: &ChoreId) -> Result<(), StoreError> {
        if self.chores.contains_key(chore_id) {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: "chore",
                id: chore_id.to_string(),
            })
        }
    }

    fn sorted<'a>(rows: impl Iterator<Item = &'a Assignment>) -> Vec<Assignment> {
        let mut rows: Vec<Assignment> = rows.cloned().collect();
        rows.sort_by_key(|a| (a.created_at, a.id));
        rows
    }
}

/// An in-memory repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total assignment rows across all chores.
    pub async fn assignment_count(&self) -> usize {
        self.tables.read().await.assignments.len()
    }
}

#[async_trait]
impl ChoreRepository for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn create_chore(&self, chore: Chore) -> Result<Chore, StoreError> {
        self.tables
            .write()
            .await
            .chores
            .insert(chore.id, chore.clone());
        Ok(chore)
    }

    async fn create_chore_with_assignments(
        &self,
        chore: Chore,
        children: &[ChildId],
        initial_state: AssignmentState,
        now: DateTime<Utc>,
    ) -> Result<(Chore, Vec<Assignment>), StoreError> {
        let mut seen = HashSet::with_capacity(children.len());
        if let Some(dup) = children.iter().find(|c| !seen.insert(**c)) {
            return Err(StoreError::AlreadyExists {
                chore_id: chore.id,
                child_id: *dup,
            });
        }

        let rows: Vec<Assignment> = children
            .iter()
            .map(|child_id| Assignment::new(chore.id, *child_id, initial_state, now))
            .collect();
        let mut tables = self.tables.write().await;
        tables.chores.insert(chore.id, chore.clone());
        for row in &rows {
            tables.assignments.insert(row.id, row.clone());
        }
        Ok((chore, rows))
    }

    async fn get_chore(&self, id: &ChoreId) -> Result<Option<Chore>, StoreError> {
        Ok(self.tables.read().await.chores.get(id).cloned())
    }

    async fn create_assignment(
        &self,
        chore_id: &ChoreId,
        child_id: &ChildId,
        initial_state: AssignmentState,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_chore(chore_id)?;

        let exists = tables
            .assignments
            .values()
            .any(|a| a.chore_id == *chore_id && a.child_id == *child_id);
        if exists {
            return Err(StoreError::AlreadyExists {
                chore_id: *chore_id,
                child_id: *child_id,
            });
        }

        let assignment = Assignment::new(*chore_id, *child_id, initial_state, now);
        tables.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    async fn claim_if_unassigned(
        &self,
        chore_id: &ChoreId,
        child_id: &ChildId,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_chore(chore_id)?;

        if tables.assignments.values().any(|a| a.chore_id == *chore_id) {
            return Err(StoreError::AlreadyClaimed(*chore_id));
        }

        let assignment = Assignment::new(*chore_id, *child_id, AssignmentState::Completed, now);
        tables.assignments.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    async fn get_assignment(&self, id: &AssignmentId) -> Result<Option<Assignment>, StoreError> {
        Ok(self.tables.read().await.assignments.get(id).cloned())
    }

    async fn update_assignment_state(
        &self,
        id: &AssignmentId,
        expected: AssignmentState,
        transition: StateTransition,
        now: DateTime<Utc>,
    ) -> Result<Assignment, StoreError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .assignments
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "assignment",
                id: id.to_string(),
            })?;

        if row.state != expected {
            return Err(StoreError::PreconditionFailed {
                id: *id,
                expected,
                actual: row.state,
            });
        }

        let payout = if transition.state == AssignmentState::Approved {
            None
        } else {
            Payout::of(row)
        };
        row.apply(&transition, now);
        let updated = row.clone();
        tables.payouts.extend(payout);
        Ok(updated)
    }

    async fn delete_assignment(&self, id: &AssignmentId) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.assignments.remove(id) {
            Some(row) => {
                tables.payouts.extend(Payout::of(&row));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_assignments_for_chore(
        &self,
        chore_id: &ChoreId,
    ) -> Result<Vec<Assignment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(Tables::sorted(
            tables.assignments.values().filter(|a| a.chore_id == *chore_id),
        ))
    }

    async fn list_assignments_for_child(
        &self,
        child_id: &ChildId,
    ) -> Result<Vec<Assignment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(Tables::sorted(
            tables.assignments.values().filter(|a| a.child_id == *child_id),
        ))
    }

    async fn balance_sources_for_child(
        &self,
        child_id: &ChildId,
    ) -> Result<BalanceSources, StoreError> {
        let tables = self.tables.read().await;
        Ok(BalanceSources {
            approved: Tables::sorted(tables.assignments.values().filter(|a| {
                a.child_id == *child_id && a.state == AssignmentState::Approved
            })),
            payouts: tables
                .payouts
                .iter()
                .filter(|p| p.child_id == *child_id)
                .cloned()
                .collect(),
            adjustments: tables
                .adjustments
                .iter()
                .filter(|a| a.child_id == *child_id)
                .cloned()
                .collect(),
        })
    }

    async fn list_payouts_for_child(&self, child_id: &ChildId) -> Result<Vec<Payout>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .payouts
            .iter()
            .filter(|p| p.child_id == *child_id)
            .cloned()
            .collect())
    }

    async fn list_adjustments_for_child(
        &self,
        child_id: &ChildId,
    ) -> Result<Vec<Adjustment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .adjustments
            .iter()
            .filter(|a| a.child_id == *child_id)
            .cloned()
            .collect())
    }

    async fn create_adjustment(
        &self,
        adjustment: NewAdjustment,
        now: DateTime<Utc>,
    ) -> Result<Adjustment, StoreError> {
        let adjustment = Adjustment::from_new(adjustment, now);
        self.tables.write().await.adjustments.push(adjustment.clone());
        Ok(adjustment)
    }
}
