//! In-flight relay tracking.
//!
//! Each accepted request gets a `RelayRecord` that follows
//! `submitted → polling → {completed, failed, provider_error} →
//! callback_attempted → done`. Records live only in memory and are dropped
//! once they reach `done`; the provider remains the source of truth for
//! threads and runs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Relay phase
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayPhase {
    Submitted,
    Polling,
    Completed,
    Failed,
    ProviderError,
    CallbackAttempted,
    Done,
}

impl RelayPhase {
    pub fn can_advance_to(self, next: RelayPhase) -> bool {
        use RelayPhase::*;
        matches!(
            (self, next),
            (Submitted, Polling)
                | (Polling, Completed | Failed | ProviderError)
                | (Completed | Failed | ProviderError, CallbackAttempted)
                | (CallbackAttempted, Done)
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Relay record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize)]
pub struct RelayRecord {
    pub relay_id: Uuid,
    pub thread_id: String,
    pub assistant_id: String,
    pub phase: RelayPhase,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RelayTracker
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
pub struct RelayTracker {
    inner: RwLock<HashMap<Uuid, RelayRecord>>,
}

impl RelayTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, relay_id: Uuid, thread_id: &str, assistant_id: &str) {
        let now = Utc::now();
        self.inner.write().insert(
            relay_id,
            RelayRecord {
                relay_id,
                thread_id: thread_id.to_owned(),
                assistant_id: assistant_id.to_owned(),
                phase: RelayPhase::Submitted,
                started_at: now,
                updated_at: now,
            },
        );
    }

    /// Move a relay to `next`. Illegal transitions are refused and logged.
    pub fn advance(&self, relay_id: &Uuid, next: RelayPhase) -> bool {
        let mut inner = self.inner.write();
        let Some(record) = inner.get_mut(relay_id) else {
            return false;
        };
        if !record.phase.can_advance_to(next) {
            tracing::warn!(
                relay_id = %relay_id,
                from = ?record.phase,
                to = ?next,
                "refused relay phase transition"
            );
            return false;
        }
        record.phase = next;
        record.updated_at = Utc::now();
        true
    }

    /// Mark the relay `done` and forget it.
    pub fn finish(&self, relay_id: &Uuid) -> Option<RelayRecord> {
        if !self.advance(relay_id, RelayPhase::Done) {
            return None;
        }
        self.inner.write().remove(relay_id)
    }

    pub fn get(&self, relay_id: &Uuid) -> Option<RelayRecord> {
        self.inner.read().get(relay_id).cloned()
    }

    /// Snapshot of in-flight relays, oldest first.
    pub fn list(&self) -> Vec<RelayRecord> {
        let mut records: Vec<RelayRecord> = self.inner.read().values().cloned().collect();
        records.sort_by_key(|r| r.started_at);
        records
    }

    pub fn in_flight(&self) -> usize {
        self.inner.read().len()
    }
}
