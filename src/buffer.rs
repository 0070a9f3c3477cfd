//! Fixed-capacity FIFO of recent log entries.
//!
//! Entries are kept in arrival order. Appending beyond capacity evicts from
//! the head; access never reorders anything.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::entry::LogEntry;

/// Default number of entries retained by the buffer.
pub const DEFAULT_BUFFER_CAPACITY: NonZeroUsize = match NonZeroUsize::new(500) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

#[derive(Debug)]
pub struct EntryBuffer {
    entries: VecDeque<Arc<LogEntry>>,
    capacity: NonZeroUsize,
}

impl Default for EntryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl EntryBuffer {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert at the tail and return how many entries were evicted.
    pub fn append(&mut self, entry: Arc<LogEntry>) -> usize {
        self.entries.push_back(entry);
        self.trim()
    }

    /// Replace the contents wholesale, keeping the server's order.
    ///
    /// When more entries are supplied than fit, the newest `capacity` win.
    pub fn initialize<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = Arc<LogEntry>>,
    {
        self.entries.clear();
        self.entries.extend(entries);
        self.trim()
    }

    fn trim(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.capacity.get());
        self.entries.drain(..excess);
        excess
    }

    /// Ordered copy of the current contents.
    pub fn snapshot(&self) -> Vec<Arc<LogEntry>> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<LogEntry>> {
        self.entries.iter()
    }

    pub fn back(&self) -> Option<&Arc<LogEntry>> {
        self.entries.back()
    }
}
