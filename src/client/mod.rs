//! The log tail client.
//!
//! [`LogTailClient`] owns a worker thread that drives a
//! [`PushChannel`](crate::channel::PushChannel) through the connection state
//! machine, applies catch-up payloads and live entries to the bounded buffer,
//! and fans notifications out to registered observers. Lost connections are
//! retried forever after a jittered delay, resubscribing from the offset of
//! the last accepted entry so nothing is missed or replayed.

mod backoff;
mod machine;
mod ready;
pub(crate) mod worker;


use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, TrySendError};
use log::warn;

use crate::channel::PushChannel;
use crate::config::{TailClientBuilder, TailConfig};
use crate::dispatch::{Dispatcher, ObserverId, TailObserver};
use crate::entry::LogEntry;
use crate::offset::Offset;
use crate::state::{CatchUpSnapshot, Shared, TailView};

pub use backoff::ReconnectJitter;
pub use machine::{ConnectionState, Transition};
pub use ready::ReadySignal;

use worker::{Command, WorkerContext, spawn_worker};

/// Self-healing subscription to a push-based log feed.
///
/// Construction starts the worker, which immediately issues the first
/// connect attempt. Queries read the shared state directly and never wait
/// on the worker, so they stay available while it is connecting or backing
/// off.
pub struct LogTailClient {
    view: TailView,
    dispatcher: Arc<Dispatcher>,
    ready: ReadySignal,
    tx: Option<Sender<Command>>,
    handle: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl LogTailClient {
    /// Client over `channel` using the default configuration.
    pub fn new<C: PushChannel>(channel: C) -> Self {
        Self::with_config(channel, TailConfig::default())
    }

    pub fn builder() -> TailClientBuilder {
        TailClientBuilder::new()
    }

    pub fn with_config<C: PushChannel>(channel: C, config: TailConfig) -> Self {
        Self::start(channel, config, Vec::new())
    }

    /// Start a client with observers registered before the first connect
    /// attempt, so they see every notification.
    pub fn start<C: PushChannel>(
        channel: C,
        config: TailConfig,
        observers: Vec<Arc<dyn TailObserver>>,
    ) -> Self {
        let shared = Arc::new(Shared::new(config.capacity));
        let dispatcher = Arc::new(Dispatcher::new());
        for observer in observers {
            dispatcher.register(observer);
        }
        let ready = ReadySignal::new();
        let context = WorkerContext {
            shared: Arc::clone(&shared),
            dispatcher: Arc::clone(&dispatcher),
            ready: ready.clone(),
        };
        let (tx, handle) = spawn_worker(channel, config, context);
        Self {
            view: TailView::new(Arc::clone(&shared)),
            dispatcher,
            ready,
            tx: Some(tx),
            handle: Some(handle),
            shared,
        }
    }

    /// Cloneable read-only view that outlives the client.
    pub fn view(&self) -> TailView {
        self.view.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.view.state()
    }

    pub fn is_connected(&self) -> bool {
        self.view.is_connected()
    }

    pub fn loggers(&self) -> BTreeSet<String> {
        self.view.loggers()
    }

    /// Entries currently retained, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<LogEntry>> {
        self.view.snapshot()
    }

    pub fn offset(&self) -> Offset {
        self.view.offset()
    }

    pub fn catch_up_snapshot(&self) -> CatchUpSnapshot {
        self.view.catch_up_snapshot()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.view.capacity()
    }

    /// Register `observer` for entry and connection notifications.
    pub fn subscribe(&self, observer: Arc<dyn TailObserver>) -> ObserverId {
        self.dispatcher.register(observer)
    }

    /// Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.dispatcher.unregister(id)
    }

    /// Signal raised once the first connect attempt has been issued.
    pub fn ready(&self) -> ReadySignal {
        self.ready.clone()
    }

    /// Ask the worker to connect now. A no-op unless disconnected; a pending
    /// reconnect delay is cut short. Never blocks: a full command queue
    /// already holds a wake-up. Returns `false` once stopped.
    pub fn connect(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| {
            matches!(
                tx.try_send(Command::Connect),
                Ok(()) | Err(TrySendError::Full(_))
            )
        })
    }

    /// Close the channel, stop reconnecting, and wait for the worker to
    /// exit. The last snapshot stays readable.
    pub fn stop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Command::Shutdown);
        }
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.join().is_err() {
            warn!("LogTailClient: worker thread panicked");
            self.shared.set_connection_state(ConnectionState::Stopped);
        }
    }
}

impl Drop for LogTailClient {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for LogTailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogTailClient")
            .field("state", &self.state())
            .field("offset", &self.offset())
            .field("observers", &self.dispatcher.len())
            .finish()
    }
}
