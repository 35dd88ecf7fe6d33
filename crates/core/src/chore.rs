//! Chore definitions — what a parent asks children to do and what it pays.

use crate::id::{ChoreId, FamilyId, ParentId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much a chore pays on approval. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardTerms {
    /// Always pays exactly this amount.
    Fixed { amount: Money },
    /// The approving parent picks an amount in `min..=max`.
    Range { min: Money, max: Money },
}

impl RewardTerms {
    pub fn fixed(amount: Money) -> Self {
        RewardTerms::Fixed { amount }
    }

    pub fn range(min: Money, max: Money) -> Self {
        RewardTerms::Range { min, max }
    }
}

impl fmt::Display for RewardTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardTerms::Fixed { amount } => write!(f, "{amount}"),
            RewardTerms::Range { min, max } => write!(f, "{min}-{max}"),
        }
    }
}

/// How many children receive a chore and whether they compete for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMode {
    /// Exactly one named child.
    Single,
    /// Every named child gets an independent copy.
    MultiIndependent,
    /// Nobody is named; the first child to complete it claims it.
    Pool,
}

impl DistributionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionMode::Single => "single",
            DistributionMode::MultiIndependent => "multi_independent",
            DistributionMode::Pool => "pool",
        }
    }
}

impl fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(DistributionMode::Single),
            "multi_independent" | "multi" => Ok(DistributionMode::MultiIndependent),
            "pool" => Ok(DistributionMode::Pool),
            other => Err(format!("unknown distribution mode '{other}'")),
        }
    }
}

/// Whether, and how often, a chore reopens after approval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    EveryDays { interval_days: u32 },
}

impl Recurrence {
    pub fn every_days(interval_days: u32) -> Self {
        Recurrence::EveryDays { interval_days }
    }

    pub fn interval_days(&self) -> Option<u32> {
        match self {
            Recurrence::None => None,
            Recurrence::EveryDays { interval_days } => Some(*interval_days),
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, Recurrence::EveryDays { .. })
    }
}

/// Input for creating a chore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChore {
    pub family_id: FamilyId,
    pub parent_id: ParentId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub reward: RewardTerms,
    pub distribution: DistributionMode,
    #[serde(default)]
    pub recurrence: Recurrence,
}

/// A persisted chore definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chore {
    pub id: ChoreId,
    pub family_id: FamilyId,
    /// The parent who authored the chore.
    pub parent_id: ParentId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub reward: RewardTerms,
    pub distribution: DistributionMode,
    #[serde(default)]
    pub recurrence: Recurrence,
    pub created_at: DateTime<Utc>,
}

impl Chore {
    /// Materialize a definition with a fresh id.
    pub fn from_new(new: NewChore, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ChoreId::new(),
            family_id: new.family_id,
            parent_id: new.parent_id,
            title: new.title.trim().to_string(),
            description: new.description,
            reward: new.reward,
            distribution: new.distribution,
            recurrence: new.recurrence,
            created_at,
        }
    }

    pub fn is_pool(&self) -> bool {
        self.distribution == DistributionMode::Pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_mode_parses_aliases() {
        assert_eq!("multi".parse::<DistributionMode>(), Ok(DistributionMode::MultiIndependent));
        assert_eq!("Pool".parse::<DistributionMode>(), Ok(DistributionMode::Pool));
        assert!("everyone".parse::<DistributionMode>().is_err());
    }

    #[test]
    fn reward_terms_serialize_tagged() {
        let json = serde_json::to_string(&RewardTerms::range(
            Money::from_cents(100),
            Money::from_cents(500),
        ))
        .unwrap();
        assert_eq!(json, r#"{"kind":"range","min":100,"max":500}"#);

        let back: RewardTerms = serde_json::from_str(r#"{"kind":"fixed","amount":200}"#).unwrap();
        assert_eq!(back, RewardTerms::fixed(Money::from_cents(200)));
    }

    #[test]
    fn recurrence_defaults_to_none() {
        assert_eq!(Recurrence::default().interval_days(), None);
        assert_eq!(Recurrence::every_days(7).interval_days(), Some(7));
        assert!(Recurrence::every_days(1).is_recurring());
    }

    #[test]
    fn from_new_trims_title() {
        let chore = Chore::from_new(
            NewChore {
                family_id: FamilyId::new(),
                parent_id: ParentId::new(),
                title: "  Take out trash ".into(),
                description: String::new(),
                reward: RewardTerms::fixed(Money::from_cents(200)),
                distribution: DistributionMode::Pool,
                recurrence: Recurrence::None,
            },
            Utc::now(),
        );
        assert_eq!(chore.title, "Take out trash");
        assert!(chore.is_pool());
    }
}
