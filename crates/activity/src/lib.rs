//! Activity feed sinks — where engine transitions are recorded.
//!
//! The engine treats every sink as write-only and best-effort.

use async_trait::async_trait;
use choreboard_core::error::ActivityError;
use choreboard_core::{ActivityEvent, ActivityKind, ActivitySink, ChoreId};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Default bound on events held in memory.
const DEFAULT_RETAIN: usize = 5_000;

/// In-memory activity log that keeps the most recent events and forwards
/// each one to its downstream sinks.
pub struct ActivityLog {
    entries: Mutex<VecDeque<ActivityEvent>>,
    retain: usize,
    sinks: Vec<Box<dyn ActivitySink>>,
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.lock().unwrap().len();
        f.debug_struct("ActivityLog")
            .field("entry_count", &count)
            .field("retain", &self.retain)
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLog {
    /// Create a new activity log with no sinks.
    pub fn new() -> Self {
        Self::with_sinks(DEFAULT_RETAIN, Vec::new())
    }

    /// Create a log that keeps at most `retain` events and forwards to `sinks`.
    pub fn with_sinks(retain: usize, sinks: Vec<Box<dyn ActivitySink>>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            retain: retain.max(1),
            sinks,
        }
    }

    /// Get all retained events, oldest first.
    pub fn entries(&self) -> Vec<ActivityEvent> {
        self.entries.lock().unwrap().iter().cloned().collect()
    }

    pub fn entries_by_kind(&self, kind: ActivityKind) -> Vec<ActivityEvent> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    pub fn entries_for_chore(&self, chore_id: &ChoreId) -> Vec<ActivityEvent> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.chore_id.as_ref() == Some(chore_id))
            .cloned()
            .collect()
    }

    /// Count of retained events.
    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Clear all retained events.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[async_trait]
impl ActivitySink for ActivityLog {
    /// Record locally, then forward. Every sink is attempted; the first
    /// downstream failure is reported after the rest have run.
    async fn emit(&self, event: ActivityEvent) -> Result<(), ActivityError> {
        {
            let mut entries = self.entries.lock().unwrap();
            if entries.len() >= self.retain {
                entries.pop_front();
            }
            entries.push_back(event.clone());
        }

        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.emit(event.clone()).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// A tracing-based sink that logs events via `tracing::info!`.
pub struct TracingSink;

#[async_trait]
impl ActivitySink for TracingSink {
    async fn emit(&self, event: ActivityEvent) -> Result<(), ActivityError> {
        tracing::info!(
            kind = ?event.kind,
            actor = ?event.actor,
            chore_id = ?event.chore_id,
            assignment_id = ?event.assignment_id,
            child_id = ?event.child_id,
            details = ?event.details,
            "ACTIVITY"
        );
        Ok(())
    }
}

/// Discards everything.
pub struct NoopSink;

#[async_trait]
impl ActivitySink for NoopSink {
    async fn emit(&self, _event: ActivityEvent) -> Result<(), ActivityError> {
        Ok(())
    }
}
