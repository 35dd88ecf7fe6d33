//! Chore assignment and reward lifecycle engine.
//!
//! ```text
//!                 ┌────────────────────┐
//!   requests ────▶│     ChoreEngine    │──── ActivitySink (best-effort)
//!                 └────────────────────┘
//!                   │    │     │     │
//!          RewardPolicy  │     │  BalanceAggregator
//!               RecurrencePolicy   │
//!                        ClaimCoordinator
//!                              │
//!                       ChoreRepository
//! ```
//!
//! The engine is stateless between calls. Lazy recurrence means nothing
//! runs in the background: due rows are reset or returned to the pool on
//! the next write that touches them.

pub mod balance;
pub mod claim;
pub mod lifecycle;
pub mod recurrence;
pub mod reward;

pub use balance::BalanceAggregator;
pub use claim::ClaimCoordinator;
pub use lifecycle::{ChoreCreated, ChoreEngine, RefreshSummary};
pub use recurrence::RecurrencePolicy;
pub use reward::RewardPolicy;
