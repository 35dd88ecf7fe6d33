//! `choreboard balance|adjust` — Read a balance or record an adjustment.

use choreboard_core::{Balance, ChildId, Money, NewAdjustment, ParentId};
use std::path::Path;

use super::{CommandResult, Output, engine, failure};

pub async fn show(config: Option<&Path>, out: &Output, child: ChildId) -> CommandResult {
    let engine = engine(config).await?;
    let balance = engine.compute_balance(&child).await.map_err(failure)?;
    out.emit(&balance, print_balance)
}

pub async fn adjust(
    config: Option<&Path>,
    out: &Output,
    child: ChildId,
    parent: ParentId,
    amount: Money,
    reason: String,
) -> CommandResult {
    let engine = engine(config).await?;
    let adjustment = engine
        .create_adjustment(NewAdjustment {
            child_id: child,
            parent_id: parent,
            amount,
            reason,
        })
        .await
        .map_err(failure)?;
    out.emit(&adjustment, |a| {
        println!("✅ Recorded {} for {}: {}", a.amount, a.child_id, a.reason);
    })?;

    if !out.is_json() {
        let balance = engine.compute_balance(&child).await.map_err(failure)?;
        println!("  New balance: {}", balance.total);
    }
    Ok(())
}

fn print_balance(balance: &Balance) {
    println!("Balance for {}", balance.child_id);
    println!("  Earned:       {}", balance.earned);
    println!("  Adjustments:  {}", balance.adjustments);
    println!("  Total:        {}", balance.total);
}
