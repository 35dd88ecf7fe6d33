//! Recurrence policy — when an approved chore reopens.
//!
//! Intervals are whole calendar days counted in one household-wide
//! reference zone, never in a per-user local time. Everything here is a
//! pure function of its inputs; the write paths decide what to mutate.

use chrono::{DateTime, Days, LocalResult, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use choreboard_core::{Assignment, AssignmentState, Chore, Error, Recurrence, Result};

#[derive(Debug, Clone, Copy)]
pub struct RecurrencePolicy {
    zone: Tz,
}

impl Default for RecurrencePolicy {
    fn default() -> Self {
        Self::utc()
    }
}

impl RecurrencePolicy {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }


    pub fn validate(&self, recurrence: &Recurrence) -> Result<()> {
        match recurrence {
            Recurrence::EveryDays { interval_days: 0 } => Err(Error::validation(
                "recurrence interval must be at least one day",
            )),
            _ => Ok(()),
        }
    }

    /// `approved_at` plus `interval_days` calendar days in the reference zone.
    ///
    /// The wall-clock time is kept across DST changes. A time repeated by a
    /// fall-back resolves to its first occurrence; a time skipped by a
    /// spring-forward is read with the offset in force before the jump.
    pub fn next_available_at(&self, approved_at: DateTime<Utc>, interval_days: u32) -> DateTime<Utc> {
        let local = approved_at.with_timezone(&self.zone).naive_local();
        let Some(target) = local.checked_add_days(Days::new(u64::from(interval_days))) else {
            return DateTime::<Utc>::MAX_UTC;
        };
        match self.zone.from_local_datetime(&target) {
            LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => at.with_timezone(&Utc),
            LocalResult::None => {
                let before = self
                    .zone
                    .offset_from_utc_datetime(&(target - TimeDelta::days(1)))
                    .fix();
                target
                    .checked_sub_signed(TimeDelta::seconds(i64::from(before.local_minus_utc())))
                    .map(|naive| naive.and_utc())
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            }
        }
    }

    /// When an approved assignment of `chore` reopens, if it ever does.
    pub fn reopens_at(&self, chore: &Chore, assignment: &Assignment) -> Option<DateTime<Utc>> {
        if assignment.state != AssignmentState::Approved {
            return None;
        }
        let interval = chore.recurrence.interval_days()?;
        let approved_at = assignment.approved_at?;
        Some(self.next_available_at(approved_at, interval))
    }

    /// An approved row of a recurring chore whose cooldown has elapsed.
    pub fn is_due(&self, chore: &Chore, assignment: &Assignment, now: DateTime<Utc>) -> bool {
        self.reopens_at(chore, assignment)
            .is_some_and(|reopens| now >= reopens)
    }

    /// Whether `assignment` can be completed at `now`.
    ///
    /// `None` stands for "no row yet", which is how an unclaimed pool chore
    /// looks: it is available.
    pub fn is_available(
        &self,
        chore: &Chore,
        assignment: Option<&Assignment>,
        now: DateTime<Utc>,
    ) -> bool {
        match assignment {
            None => true,
            Some(a) => match a.state {
                // A pool row exists only while claimed.
                AssignmentState::Pending | AssignmentState::Rejected => !chore.is_pool(),
                AssignmentState::Completed => false,
                AssignmentState::Approved => self.is_due(chore, a, now),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use choreboard_core::{
        ChildId, DistributionMode, FamilyId, Money, NewChore, ParentId, RewardTerms,
        StateTransition,
    };

    fn chore(mode: DistributionMode, recurrence: Recurrence) -> Chore {
        Chore::from_new(
            NewChore {
                family_id: FamilyId::new(),
                parent_id: ParentId::new(),
                title: "Dishes".into(),
                description: String::new(),
                reward: RewardTerms::fixed(Money::from_cents(200)),
                distribution: mode,
                recurrence,
            },
            Utc::now(),
        )
    }

    fn approved_at(chore: &Chore, at: DateTime<Utc>) -> Assignment {
        let mut a = Assignment::new(chore.id, ChildId::new(), AssignmentState::Completed, at);
        a.apply(&StateTransition::approved(a.completed_at, at, Money::from_cents(200)), at);
        a
    }

    #[test]
    fn seven_day_cooldown_boundary() {
        let policy = RecurrencePolicy::utc();
        let c = chore(DistributionMode::Single, Recurrence::every_days(7));
        let t = Utc.with_ymd_and_hms(2024, 5, 6, 18, 30, 0).unwrap();
        let a = approved_at(&c, t);

        let almost = t + Duration::days(6) + Duration::hours(23) + Duration::minutes(59) + Duration::seconds(59);
        assert!(!policy.is_available(&c, Some(&a), almost));
        assert!(policy.is_available(&c, Some(&a), t + Duration::days(7)));
    }

    #[test]
    fn non_recurring_approval_is_terminal() {
        let policy = RecurrencePolicy::utc();
        let c = chore(DistributionMode::Single, Recurrence::None);
        let t = Utc::now();
        let a = approved_at(&c, t);
        assert!(!policy.is_available(&c, Some(&a), t + Duration::days(365)));
        assert_eq!(policy.reopens_at(&c, &a), None);
    }

    #[test]
    fn pending_and_rejected_are_available() {
        let policy = RecurrencePolicy::utc();
        let c = chore(DistributionMode::Single, Recurrence::None);
        let now = Utc::now();
        let mut a = Assignment::new(c.id, ChildId::new(), AssignmentState::Pending, now);
        assert!(policy.is_available(&c, Some(&a), now));

        a.apply(&StateTransition::completed(now), now);
        assert!(!policy.is_available(&c, Some(&a), now));

        a.apply(&StateTransition::rejected(a.completed_at, "redo"), now);
        assert!(policy.is_available(&c, Some(&a), now));
    }

    #[test]
    fn unclaimed_pool_chore_is_available() {
        let policy = RecurrencePolicy::utc();
        let c = chore(DistributionMode::Pool, Recurrence::every_days(1));
        assert!(policy.is_available(&c, None, Utc::now()));
    }

    #[test]
    fn calendar_days_are_counted_in_reference_zone() {
        let zone = chrono_tz::America::New_York;
        let policy = RecurrencePolicy::new(zone);
        // 23:30 on the 1st in New York is 04:30 on the 2nd in UTC.
        let approved = Utc.with_ymd_and_hms(2024, 2, 2, 4, 30, 0).unwrap();
        let next = policy.next_available_at(approved, 2);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 2, 4, 4, 30, 0).unwrap());
        assert_eq!(next.with_timezone(&zone).format("%d %H:%M").to_string(), "03 23:30");
    }

    #[test]
    fn week_across_spring_forward_keeps_wall_clock() {
        let policy = RecurrencePolicy::new(chrono_tz::America::New_York);
        // Noon EST on Saturday; clocks jump forward the next morning.
        let approved = Utc.with_ymd_and_hms(2024, 3, 9, 17, 0, 0).unwrap();
        let next = policy.next_available_at(approved, 7);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 16, 16, 0, 0).unwrap());
        assert_eq!(next - approved, Duration::days(7) - Duration::hours(1));

        let utc_next = RecurrencePolicy::utc().next_available_at(approved, 7);
        assert_eq!(utc_next, Utc.with_ymd_and_hms(2024, 3, 16, 17, 0, 0).unwrap());
    }

    #[test]
    fn week_across_fall_back_keeps_wall_clock() {
        let policy = RecurrencePolicy::new(chrono_tz::America::New_York);
        let approved = Utc.with_ymd_and_hms(2024, 11, 2, 16, 0, 0).unwrap();
        let next = policy.next_available_at(approved, 7);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 11, 9, 17, 0, 0).unwrap());
    }

    #[test]
    fn skipped_and_repeated_local_times_resolve() {
        let policy = RecurrencePolicy::new(chrono_tz::America::New_York);

        // 02:30 on 10 March 2024 never happens in New York.
        let approved = Utc.with_ymd_and_hms(2024, 3, 9, 7, 30, 0).unwrap();
        assert_eq!(
            policy.next_available_at(approved, 1),
            Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap()
        );

        // 01:30 on 3 November 2024 happens twice; the EDT one comes first.
        let approved = Utc.with_ymd_and_hms(2024, 11, 2, 5, 30, 0).unwrap();
        assert_eq!(
            policy.next_available_at(approved, 1),
            Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap()
        );
    }

    #[test]
    fn zero_interval_rejected() {
        let policy = RecurrencePolicy::utc();
        assert!(policy.validate(&Recurrence::every_days(0)).is_err());
        assert!(policy.validate(&Recurrence::every_days(1)).is_ok());
        assert!(policy.validate(&Recurrence::None).is_ok());
    }
}
