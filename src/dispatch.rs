//! Observer registration and typed event fan-out.
//!
//! The client's worker thread is the only caller of [`Dispatcher::dispatch`],
//! and it dispatches only after the state lock has been released. Observers
//! may therefore query the client from inside a callback and always see the
//! state the event describes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::warn;
use parking_lot::RwLock;

use crate::entry::LogEntry;
use crate::error::ProtocolViolation;
use crate::state::CatchUpApplied;

/// Receives notifications from a [`LogTailClient`](crate::LogTailClient).
///
/// Callbacks run on the client's worker thread and should return promptly.
/// Every method has an empty default so observers implement only what they
/// need.
pub trait TailObserver: Send + Sync {
    /// A live entry has been appended and the offset advanced past it.
    fn on_entry_received(&self, _entry: &Arc<LogEntry>) {}

    /// The client entered (`true`) or left (`false`) the connected state.
    fn on_connection_state_changed(&self, _is_connected: bool) {}

    /// A catch-up payload replaced the loggers and entries.
    fn on_catch_up(&self, _applied: &CatchUpApplied) {}

    /// An inbound event was dropped for breaking the ordering contract.
    fn on_protocol_violation(&self, _violation: &ProtocolViolation) {}
}

/// Notification routed to observers.
#[derive(Clone, Debug)]
pub enum TailEvent {
    EntryReceived(Arc<LogEntry>),
    ConnectionStateChanged(bool),
    CatchUp(CatchUpApplied),
    ProtocolViolation(ProtocolViolation),
}

impl TailEvent {
    fn deliver(&self, observer: &dyn TailObserver) {
        match self {
            TailEvent::EntryReceived(entry) => observer.on_entry_received(entry),
            TailEvent::ConnectionStateChanged(connected) => {
                observer.on_connection_state_changed(*connected)
            }
            TailEvent::CatchUp(applied) => observer.on_catch_up(applied),
            TailEvent::ProtocolViolation(violation) => observer.on_protocol_violation(violation),
        }
    }
}

/// Handle returned by registration; pass it back to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

type ObserverList = Vec<(ObserverId, Arc<dyn TailObserver>)>;

#[derive(Default)]
pub struct Dispatcher {
    observers: RwLock<ObserverList>,
    next_id: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Arc<dyn TailObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    /// Remove an observer. Returns `false` if `id` was not registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every registered observer.
    ///
    /// The observer list is copied first so callbacks may register or
    /// unregister without deadlocking. A panicking observer is logged and
    /// does not prevent delivery to the others.
    pub fn dispatch(&self, event: &TailEvent) {
        let observers: ObserverList = self.observers.read().clone();
        for (id, observer) in observers {
            let delivered = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                event.deliver(observer.as_ref())
            }));
            if delivered.is_err() {
                warn!("LogTailClient: observer {id:?} panicked while handling {event:?}");
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("observers", &self.len())
            .finish()
    }
}
