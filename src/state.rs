//! Tail state guarded by a single lock.
//!
//! The entry buffer, offset tracker and logger set change together: catch-up
//! replaces the buffer and loggers in one step, and live acceptance appends
//! and advances the offset in one step. Both happen under the same write
//! lock, so readers only ever observe complete transitions.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::RwLock;

use crate::buffer::EntryBuffer;
use crate::client::ConnectionState;
use crate::entry::LogEntry;
use crate::error::ProtocolViolation;
use crate::offset::{Offset, OffsetTracker};

#[derive(Debug)]
pub struct TailState {
    buffer: EntryBuffer,
    offset: OffsetTracker,
    loggers: BTreeSet<String>,
    caught_up: bool,
}

/// Outcome of applying a catch-up payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatchUpApplied {
    pub loggers: usize,
    pub entries: usize,
    pub evicted: usize,
    pub offset: Offset,
}

impl TailState {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            buffer: EntryBuffer::new(capacity),
            offset: OffsetTracker::new(),
            loggers: BTreeSet::new(),
            caught_up: false,
        }
    }

    /// Forget the previous connection's catch-up; live events are refused
    /// until the next one arrives.
    pub fn begin_connection(&mut self) {
        self.caught_up = false;
    }

    pub fn is_caught_up(&self) -> bool {
        self.caught_up
    }

    /// Replace loggers and entries wholesale and advance the offset to the
    /// newest cached entry.
    pub fn apply_catch_up<L, E>(&mut self, loggers: L, entries: E) -> CatchUpApplied
    where
        L: IntoIterator<Item = String>,
        E: IntoIterator<Item = Arc<LogEntry>>,
    {
        self.loggers = loggers.into_iter().collect();
        let evicted = self.buffer.initialize(entries);
        if let Some(last) = self.buffer.back() {
            self.offset.advance_to(last.id);
        }
        self.caught_up = true;
        CatchUpApplied {
            loggers: self.loggers.len(),
            entries: self.buffer.len(),
            evicted,
            offset: self.offset.current(),
        }
    }

    /// Append a live entry and advance the offset past it.
    pub fn accept_live(&mut self, entry: LogEntry) -> Result<Arc<LogEntry>, ProtocolViolation> {
        if !self.caught_up {
            return Err(ProtocolViolation::LiveBeforeCatchUp { id: entry.id });
        }
        self.offset.check(entry.id)?;
        let entry = Arc::new(entry);
        self.buffer.append(Arc::clone(&entry));
        self.offset.accept(entry.id)?;
        Ok(entry)
    }

    pub fn offset(&self) -> Offset {
        self.offset.current()
    }

    pub fn loggers(&self) -> &BTreeSet<String> {
        &self.loggers
    }

    pub fn buffer(&self) -> &EntryBuffer {
        &self.buffer
    }
}

/// Loggers, entries and offset captured under one read lock.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatchUpSnapshot {
    pub loggers: BTreeSet<String>,
    pub entries: Vec<Arc<LogEntry>>,
    pub offset: Offset,
}

#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) state: RwLock<TailState>,
    connection: AtomicU8,
}

impl Shared {
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        Self {
            state: RwLock::new(TailState::new(capacity)),
            connection: AtomicU8::new(u8::from(ConnectionState::Disconnected)),
        }
    }

    pub(crate) fn connection_state(&self) -> ConnectionState {
        ConnectionState::from(self.connection.load(Ordering::Acquire))
    }

    pub(crate) fn set_connection_state(&self, state: ConnectionState) -> ConnectionState {
        ConnectionState::from(self.connection.swap(u8::from(state), Ordering::AcqRel))
    }
}

/// Read-only view of a client's state.
///
/// Views are cheap to clone and stay valid after the client stops, leaving
/// the last received entries available.
#[derive(Clone, Debug)]
pub struct TailView {
    shared: Arc<Shared>,
}

impl TailView {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.connection_state()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn loggers(&self) -> BTreeSet<String> {
        self.shared.state.read().loggers.clone()
    }

    pub fn snapshot(&self) -> Vec<Arc<LogEntry>> {
        self.shared.state.read().buffer.snapshot()
    }

    pub fn offset(&self) -> Offset {
        self.shared.state.read().offset()
    }

    pub fn len(&self) -> usize {
        self.shared.state.read().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.shared.state.read().buffer.capacity()
    }

    /// Read loggers, entries and offset together.
    pub fn catch_up_snapshot(&self) -> CatchUpSnapshot {
        let state = self.shared.state.read();
        CatchUpSnapshot {
            loggers: state.loggers.clone(),
            entries: state.buffer.snapshot(),
            offset: state.offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::LogEventData;
    use crate::level::Level;
    use rstest::{fixture, rstest};

    fn entry(id: u64) -> LogEntry {
        LogEntry::new(
            id,
            format!("line {id}"),
            LogEventData::new("core", Level::Info, &format!("msg-{id}")),
        )
    }

    fn ids(state: &TailState) -> Vec<u64> {
        state.buffer().iter().map(|e| e.id).collect()
    }

    #[fixture]
    fn state() -> TailState {
        TailState::new(NonZeroUsize::new(3).expect("non-zero capacity"))
    }

    #[rstest]
    fn live_before_catch_up_is_refused(mut state: TailState) {
        let err = state.accept_live(entry(1)).expect_err("must refuse");
        assert_eq!(err, ProtocolViolation::LiveBeforeCatchUp { id: 1 });
        assert!(state.buffer().is_empty());
        assert_eq!(state.offset(), Offset::BEGINNING);
    }

    #[rstest]
    fn catch_up_replaces_loggers_entries_and_offset(mut state: TailState) {
        state.apply_catch_up(vec!["old".to_string()], vec![Arc::new(entry(1))]);
        let applied = state.apply_catch_up(
            vec!["A".to_string(), "B".to_string()],
            vec![Arc::new(entry(5)), Arc::new(entry(6))],
        );
        assert_eq!(applied.offset, Offset::new(6));
        assert_eq!(applied.loggers, 2);
        assert_eq!(ids(&state), vec![5, 6]);
        let loggers: Vec<&str> = state.loggers().iter().map(String::as_str).collect();
        assert_eq!(loggers, vec!["A", "B"]);
    }

    #[rstest]
    fn empty_catch_up_keeps_offset(mut state: TailState) {
        state.apply_catch_up(Vec::new(), vec![Arc::new(entry(9))]);
        state.begin_connection();
        let applied = state.apply_catch_up(Vec::new(), Vec::new());
        assert_eq!(applied.offset, Offset::new(9));
        assert!(state.buffer().is_empty());
    }

    #[rstest]
    fn accepts_live_entries_in_order(mut state: TailState) {
        state.apply_catch_up(Vec::new(), Vec::new());
        for id in 1..=4 {
            state.accept_live(entry(id)).expect("accept entry");
        }
        assert_eq!(ids(&state), vec![2, 3, 4]);
        assert_eq!(state.offset(), Offset::new(4));
    }

    #[rstest]
    fn stale_live_entry_is_dropped(mut state: TailState) {
        state.apply_catch_up(Vec::new(), vec![Arc::new(entry(3))]);
        let err = state.accept_live(entry(3)).expect_err("duplicate refused");
        assert!(matches!(err, ProtocolViolation::StaleSequence { id: 3, .. }));
        assert_eq!(ids(&state), vec![3]);
    }

    #[rstest]
    fn new_connection_requires_fresh_catch_up(mut state: TailState) {
        state.apply_catch_up(Vec::new(), Vec::new());
        state.begin_connection();
        assert!(!state.is_caught_up());
        assert!(state.accept_live(entry(1)).is_err());
    }
}
