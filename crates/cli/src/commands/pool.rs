//! `choreboard claim|refresh|available` — Pool claims and recurrence.

use choreboard_core::{ChildId, ChoreId};
use serde_json::json;
use std::path::Path;

use super::assignment::print_assignment;
use super::{CommandResult, Output, engine, failure};

pub async fn claim(
    config: Option<&Path>,
    out: &Output,
    chore: ChoreId,
    child: ChildId,
) -> CommandResult {
    let engine = engine(config).await?;
    let row = engine.claim_pool_chore(&chore, &child).await.map_err(failure)?;
    out.emit(&row, |row| {
        println!("🏁 Claimed and marked done, waiting for a parent to approve");
        print_assignment(row);
    })
}

pub async fn refresh(config: Option<&Path>, out: &Output, chore: ChoreId) -> CommandResult {
    let engine = engine(config).await?;
    let summary = engine.refresh_if_due(&chore).await.map_err(failure)?;
    let value = json!({
        "reset": summary.reset,
        "returned_to_pool": summary.returned_to_pool,
    });
    out.emit(&value, |_| {
        if summary.is_empty() {
            println!("Nothing due");
        }
        if summary.reset > 0 {
            println!("🔄 Reopened {} assignment(s)", summary.reset);
        }
        if summary.returned_to_pool > 0 {
            println!("🔄 Returned to the pool");
        }
    })
}

pub async fn available(
    config: Option<&Path>,
    out: &Output,
    chore: ChoreId,
    child: ChildId,
) -> CommandResult {
    let engine = engine(config).await?;
    let available = engine.is_available(&chore, &child).await.map_err(failure)?;
    out.emit(&json!({ "available": available }), |_| {
        if available {
            println!("✅ Available");
        } else {
            println!("⏳ Not available right now");
        }
    })
}
