//! Observer that accumulates notifications in memory for test assertions.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::dispatch::TailObserver;
use crate::entry::LogEntry;
use crate::error::ProtocolViolation;
use crate::state::CatchUpApplied;

#[derive(Debug, Default)]
struct Collected {
    entries: Vec<Arc<LogEntry>>,
    connection_changes: Vec<bool>,
    catch_ups: Vec<CatchUpApplied>,
    violations: Vec<ProtocolViolation>,
}

/// Observer that stores every notification it receives.
#[derive(Clone, Debug, Default)]
pub struct CollectingObserver {
    collected: Arc<Mutex<Collected>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Arc<LogEntry>> {
        self.collected.lock().entries.clone()
    }

    pub fn entry_ids(&self) -> Vec<u64> {
        self.collected.lock().entries.iter().map(|e| e.id).collect()
    }

    pub fn connection_changes(&self) -> Vec<bool> {
        self.collected.lock().connection_changes.clone()
    }

    pub fn catch_ups(&self) -> Vec<CatchUpApplied> {
        self.collected.lock().catch_ups.clone()
    }

    pub fn violations(&self) -> Vec<ProtocolViolation> {
        self.collected.lock().violations.clone()
    }
}

impl TailObserver for CollectingObserver {
    fn on_entry_received(&self, entry: &Arc<LogEntry>) {
        self.collected.lock().entries.push(Arc::clone(entry));
    }

    fn on_connection_state_changed(&self, is_connected: bool) {
        self.collected.lock().connection_changes.push(is_connected);
    }

    fn on_catch_up(&self, applied: &CatchUpApplied) {
        self.collected.lock().catch_ups.push(applied.clone());
    }

    fn on_protocol_violation(&self, violation: &ProtocolViolation) {
        self.collected.lock().violations.push(violation.clone());
    }
}
