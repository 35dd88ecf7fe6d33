//! # Choreboard Core
//!
//! Domain types, traits, and error definitions for the Choreboard chore
//! and reward engine. This crate has **no framework dependencies**: it
//! defines the domain model that the store, activity and engine crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here:
//! - [`ChoreRepository`] for durable chores, assignments and adjustments
//! - [`ActivitySink`] for the write-only activity feed
//! - [`Clock`] for the current time
//!
//! Implementations live in their respective crates, so the engine can be
//! exercised against in-memory stand-ins with a manual clock.

pub mod error;
pub mod id;
pub mod money;
pub mod chore;
pub mod assignment;
pub mod adjustment;
pub mod repository;
pub mod activity;
pub mod clock;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ErrorKind, Result, StoreError, ActivityError};
pub use id::{AdjustmentId, AssignmentId, ChildId, ChoreId, FamilyId, ParentId};
pub use money::Money;
pub use chore::{Chore, DistributionMode, NewChore, Recurrence, RewardTerms};
pub use assignment::{Assignment, AssignmentState, Payout, StateTransition};
pub use adjustment::{Adjustment, Balance, BalanceSources, NewAdjustment};
pub use repository::ChoreRepository;
pub use activity::{ActivityEvent, ActivityKind, ActivitySink, Actor};
pub use clock::{Clock, ManualClock, SystemClock};
