//! `choreboard chore` — Create or inspect chores.

use choreboard_core::{
    Assignment, ChildId, Chore, ChoreId, DistributionMode, FamilyId, Money, NewChore, ParentId,
    Recurrence, RewardTerms,
};
use choreboard_engine::ChoreEngine;
use serde_json::json;
use std::path::Path;

use super::assignment::print_assignment;
use super::{CommandResult, Output, engine, failure};

/// Flags of `chore create`, after clap has checked that exactly one of
/// `--reward` or `--min/--max` was given.
pub struct CreateArgs {
    pub title: String,
    pub description: String,
    pub parent: ParentId,
    pub family: Option<FamilyId>,
    pub mode: DistributionMode,
    pub reward: Option<Money>,
    pub range: Option<(Money, Money)>,
    pub every_days: Option<u32>,
    pub children: Vec<ChildId>,
}

impl CreateArgs {
    fn into_new_chore(self) -> CommandResult<(NewChore, Vec<ChildId>)> {
        let reward = match (self.reward, self.range) {
            (Some(amount), None) => RewardTerms::fixed(amount),
            (None, Some((min, max))) => RewardTerms::range(min, max),
            _ => return Err("pass either --reward or both --min and --max".into()),
        };
        let new = NewChore {
            family_id: self.family.unwrap_or_default(),
            parent_id: self.parent,
            title: self.title,
            description: self.description,
            reward,
            distribution: self.mode,
            recurrence: self.every_days.map_or(Recurrence::None, Recurrence::every_days),
        };
        Ok((new, self.children))
    }
}

pub async fn create(config: Option<&Path>, out: &Output, args: CreateArgs) -> CommandResult {
    let (new, children) = args.into_new_chore()?;
    let engine = engine(config).await?;
    let created = engine
        .create_chore_assignments(new, &children)
        .await
        .map_err(failure)?;

    let value = json!({
        "chore": created.chore,
        "assignments": created.assignments,
    });
    out.emit(&value, |_| {
        let chore = &created.chore;
        println!("✅ Created chore {}", chore.id);
        println!("  Title:    {}", chore.title);
        println!("  Family:   {}", chore.family_id);
        println!("  Reward:   {}", chore.reward);
        println!("  Mode:     {}", chore.distribution);
        if let Some(days) = chore.recurrence.interval_days() {
            println!("  Repeats:  every {days} day(s) after approval");
        }
        if created.assignments.is_empty() {
            println!("  Open to any child in the family: claim it with `choreboard claim`");
        }
        for row in &created.assignments {
            println!("  Assigned {} → {}", row.child_id, row.id);
        }
    })
}

pub async fn show(config: Option<&Path>, out: &Output, chore_id: ChoreId) -> CommandResult {
    let engine = engine(config).await?;
    let chore = engine.get_chore(&chore_id).await.map_err(failure)?;
    let rows = engine.assignments_for_chore(&chore_id).await.map_err(failure)?;

    let assignments: Vec<_> = rows
        .iter()
        .map(|row| {
            json!({
                "assignment": row,
                "reopens_at": engine.recurrence().reopens_at(&chore, row),
            })
        })
        .collect();
    let value = json!({ "chore": chore, "assignments": assignments });

    out.emit(&value, |_| {
        println!("{} ({})", chore.title, chore.id);
        if !chore.description.is_empty() {
            println!("  {}", chore.description);
        }
        println!("  Reward:   {}", chore.reward);
        println!("  Mode:     {}", chore.distribution);
        match chore.recurrence.interval_days() {
            Some(days) => println!("  Repeats:  every {days} day(s)"),
            None => println!("  Repeats:  never"),
        }
        if rows.is_empty() {
            println!("\n  No assignments");
        }
        for row in &rows {
            print_row(&engine, &chore, row);
        }
    })
}

fn print_row(engine: &ChoreEngine, chore: &Chore, row: &Assignment) {
    println!();
    print_assignment(row);
    if let Some(at) = engine.recurrence().reopens_at(chore, row) {
        println!("  Reopens:  {at}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(reward: Option<Money>, range: Option<(Money, Money)>) -> CreateArgs {
        CreateArgs {
            title: "Fold laundry".into(),
            description: String::new(),
            parent: ParentId::new(),
            family: None,
            mode: DistributionMode::Pool,
            reward,
            range,
            every_days: Some(7),
            children: Vec::new(),
        }
    }

    #[test]
    fn fixed_reward_and_weekly_recurrence() {
        let (new, children) = args(Some(Money::from_cents(300)), None)
            .into_new_chore()
            .unwrap();
        assert_eq!(new.reward, RewardTerms::fixed(Money::from_cents(300)));
        assert_eq!(new.recurrence, Recurrence::every_days(7));
        assert!(children.is_empty());
    }

    #[test]
    fn range_reward() {
        let (new, _) = args(None, Some((Money::from_cents(100), Money::from_cents(400))))
            .into_new_chore()
            .unwrap();
        assert_eq!(
            new.reward,
            RewardTerms::range(Money::from_cents(100), Money::from_cents(400))
        );
    }

    #[test]
    fn missing_reward_is_an_error() {
        assert!(args(None, None).into_new_chore().is_err());
    }
}
