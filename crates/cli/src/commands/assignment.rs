//! `choreboard complete|approve|reject` — Move an assignment through its cycle.

use choreboard_core::{Assignment, AssignmentId, Money, ParentId};
use std::path::Path;

use super::{CommandResult, Output, engine, failure};

pub async fn complete(config: Option<&Path>, out: &Output, id: AssignmentId) -> CommandResult {
    let engine = engine(config).await?;
    let row = engine.complete_assignment(&id).await.map_err(failure)?;
    out.emit(&row, |row| {
        println!("✅ Marked done, waiting for a parent to approve");
        print_assignment(row);
    })
}

pub async fn approve(
    config: Option<&Path>,
    out: &Output,
    id: AssignmentId,
    parent: ParentId,
    amount: Option<Money>,
) -> CommandResult {
    let engine = engine(config).await?;
    let row = engine
        .approve_assignment(&id, parent, amount)
        .await
        .map_err(failure)?;
    out.emit(&row, |row| {
        println!("✅ Approved");
        print_assignment(row);
    })
}

pub async fn reject(
    config: Option<&Path>,
    out: &Output,
    id: AssignmentId,
    parent: ParentId,
    reason: &str,
) -> CommandResult {
    let engine = engine(config).await?;
    let row = engine
        .reject_assignment(&id, parent, reason)
        .await
        .map_err(failure)?;
    out.emit(&row, |row| {
        println!("↩️  Sent back");
        print_assignment(row);
    })
}

pub(super) fn print_assignment(row: &Assignment) {
    println!("  Assignment: {}", row.id);
    println!("  Child:      {}", row.child_id);
    println!("  State:      {}", row.state);
    if let Some(at) = row.completed_at {
        println!("  Completed:  {at}");
    }
    if let Some(at) = row.approved_at {
        println!("  Approved:   {at}");
    }
    if let Some(amount) = row.payable_amount {
        println!("  Paid:       {amount}");
    }
    if let Some(reason) = &row.rejection_reason {
        println!("  Reason:     {reason}");
    }
}
