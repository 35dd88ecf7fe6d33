//! Manual balance adjustments and the derived balance view.

use crate::assignment::{Assignment, Payout};
use crate::id::{AdjustmentId, ChildId, ParentId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input for recording an adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdjustment {
    pub child_id: ChildId,
    /// The parent recording the adjustment.
    pub parent_id: ParentId,
    /// Signed and nonzero.
    pub amount: Money,
    pub reason: String,
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub id: AdjustmentId,
    pub child_id: ChildId,
    pub parent_id: ParentId,
    pub amount: Money,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl Adjustment {
    pub fn from_new(new: NewAdjustment, created_at: DateTime<Utc>) -> Self {
        Self {
            id: AdjustmentId::new(),
            child_id: new.child_id,
            parent_id: new.parent_id,
            amount: new.amount,
            reason: new.reason.trim().to_string(),
            created_at,
        }
    }
}

/// A child's balance, recomputed from its sources on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub child_id: ChildId,
    /// Σ payable amount over approved assignments, current and archived.
    pub earned: Money,
    /// Σ adjustment amounts.
    pub adjustments: Money,
    pub total: Money,
}

impl Balance {
    /// Total the snapshot. `None` if any sum leaves the range of `Money`.
    pub fn from_sources(child_id: ChildId, sources: &BalanceSources) -> Option<Self> {
        let current = sources.approved.iter().map(Assignment::earned);
        let archived = sources.payouts.iter().map(|p| p.amount);
        let earned = Money::checked_sum(current.chain(archived))?;
        let adjustments = Money::checked_sum(sources.adjustments.iter().map(|a| a.amount))?;
        Some(Self {
            child_id,
            earned,
            adjustments,
            total: earned.checked_add(adjustments)?,
        })
    }
}

/// Everything a balance is derived from, read in one consistent snapshot.
///
/// A row reset or deleted mid-read would otherwise be seen twice: once as
/// an approved row and once as its archived payout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceSources {
    /// The child's rows currently in `Approved`.
    pub approved: Vec<Assignment>,
    pub payouts: Vec<Payout>,
    pub adjustments: Vec<Adjustment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjustment(child_id: ChildId, cents: i64) -> Adjustment {
        Adjustment::from_new(
            NewAdjustment {
                child_id,
                parent_id: ParentId::new(),
                amount: Money::from_cents(cents),
                reason: "pocket money".into(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn balance_total_is_sum_of_parts() {
        let child = ChildId::new();
        let sources = BalanceSources {
            approved: Vec::new(),
            payouts: vec![Payout {
                assignment_id: crate::AssignmentId::new(),
                chore_id: crate::ChoreId::new(),
                child_id: child,
                amount: Money::from_cents(1000),
                approved_at: Utc::now(),
            }],
            adjustments: vec![adjustment(child, -250)],
        };
        let b = Balance::from_sources(child, &sources).unwrap();
        assert_eq!(b.earned, Money::from_cents(1000));
        assert_eq!(b.adjustments, Money::from_cents(-250));
        assert_eq!(b.total, Money::from_cents(750));
    }

    #[test]
    fn overflowing_balance_is_refused() {
        let child = ChildId::new();
        let sources = BalanceSources {
            adjustments: vec![adjustment(child, i64::MAX), adjustment(child, 1)],
            ..BalanceSources::default()
        };
        assert!(Balance::from_sources(child, &sources).is_none());
    }

    #[test]
    fn adjustment_reason_is_trimmed() {
        let adj = Adjustment::from_new(
            NewAdjustment {
                child_id: ChildId::new(),
                parent_id: ParentId::new(),
                amount: Money::from_cents(-100),
                reason: " candy ".into(),
            },
            Utc::now(),
        );
        assert_eq!(adj.reason, "candy");
    }
}
