//! Reward policy — validates reward terms and resolves the payout.

use choreboard_core::{Error, Money, Result, RewardTerms};

/// Resolves what an approval pays.
#[derive(Debug, Clone, Copy)]
pub struct RewardPolicy {
    max_reward: Money,
}

impl RewardPolicy {
    pub fn new(max_reward: Money) -> Self {
        Self { max_reward }
    }

    /// Check terms at chore creation.
    pub fn validate_terms(&self, terms: &RewardTerms) -> Result<()> {
        match *terms {
            RewardTerms::Fixed { amount } => {
                if amount.is_negative() {
                    return Err(Error::validation("reward cannot be negative"));
                }
                self.check_cap(amount)
            }
            RewardTerms::Range { min, max } => {
                if min.is_negative() {
                    return Err(Error::validation("reward minimum cannot be negative"));
                }
                if min >= max {
                    return Err(Error::InvalidRewardRange { min, max });
                }
                self.check_cap(max)
            }
        }
    }

    /// The amount credited on approval.
    ///
    /// Fixed terms always pay the fixed amount; an explicitly asserted
    /// amount that disagrees is refused rather than silently replaced.
    /// Range terms require an amount within `min..=max`.
    pub fn resolve(&self, terms: &RewardTerms, requested: Option<Money>) -> Result<Money> {
        match (*terms, requested) {
            (RewardTerms::Fixed { amount }, None) => Ok(amount),
            (RewardTerms::Fixed { amount }, Some(asked)) if asked == amount => Ok(amount),
            (RewardTerms::Fixed { amount }, Some(asked)) => Err(Error::validation(format!(
                "chore pays a fixed {amount}; {asked} cannot be approved"
            ))),
            (RewardTerms::Range { min, max }, None) => Err(Error::validation(format!(
                "an amount between {min} and {max} is required"
            ))),
            (RewardTerms::Range { min, max }, Some(amount)) => {
                if amount < min || amount > max {
                    Err(Error::RewardOutOfRange { amount, min, max })
                } else {
                    Ok(amount)
                }
            }
        }
    }

    fn check_cap(&self, amount: Money) -> Result<()> {
        if amount > self.max_reward {
            return Err(Error::validation(format!(
                "reward {amount} exceeds the configured maximum of {}",
                self.max_reward
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreboard_core::ErrorKind;

    fn policy() -> RewardPolicy {
        RewardPolicy::new(Money::from_cents(100_00))
    }

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    #[test]
    fn fixed_reward_pays_fixed_amount() {
        let terms = RewardTerms::fixed(cents(200));
        assert_eq!(policy().resolve(&terms, None).unwrap(), cents(200));
        assert_eq!(policy().resolve(&terms, Some(cents(200))).unwrap(), cents(200));
    }

    #[test]
    fn fixed_reward_refuses_conflicting_amount() {
        let terms = RewardTerms::fixed(cents(200));
        let err = policy().resolve(&terms, Some(cents(300))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let terms = RewardTerms::range(cents(100), cents(500));
        assert_eq!(policy().resolve(&terms, Some(cents(100))).unwrap(), cents(100));
        assert_eq!(policy().resolve(&terms, Some(cents(500))).unwrap(), cents(500));
        assert_eq!(policy().resolve(&terms, Some(cents(321))).unwrap(), cents(321));
    }

    #[test]
    fn range_rejects_one_cent_outside() {
        let terms = RewardTerms::range(cents(100), cents(500));
        for amount in [cents(99), cents(501)] {
            let err = policy().resolve(&terms, Some(amount)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RewardOutOfRange);
        }
    }

    #[test]
    fn range_requires_amount() {
        let terms = RewardTerms::range(cents(100), cents(500));
        let err = policy().resolve(&terms, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn creation_requires_strict_range() {
        for (min, max) in [(500, 500), (600, 500)] {
            let err = policy()
                .validate_terms(&RewardTerms::range(cents(min), cents(max)))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRewardRange);
        }
        assert!(policy().validate_terms(&RewardTerms::range(cents(499), cents(500))).is_ok());
    }

    #[test]
    fn creation_rejects_negative_and_oversized_rewards() {
        let p = RewardPolicy::new(cents(1000));
        assert_eq!(
            p.validate_terms(&RewardTerms::fixed(cents(-1))).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            p.validate_terms(&RewardTerms::range(cents(-5), cents(5))).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            p.validate_terms(&RewardTerms::fixed(cents(1001))).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert!(p.validate_terms(&RewardTerms::fixed(cents(1000))).is_ok());
        assert!(p.validate_terms(&RewardTerms::fixed(Money::ZERO)).is_ok());
    }
}
