//! Worker thread driving the push channel.
//!
//! The worker is the single writer of the tail state. Control commands
//! arrive on a bounded queue; inbound channel messages arrive on a separate
//! unbounded queue so a transport answering on the worker's own thread can
//! never block it. Observers are notified only after the state they
//! describe has been applied.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvError, Sender, bounded, select, unbounded};
use log::{debug, info, warn};

use crate::channel::{ChannelState, InboundEvent, InboundSink, PushChannel};
use crate::config::TailConfig;
use crate::dispatch::{Dispatcher, TailEvent};
use crate::entry::LogEntry;
use crate::error::ProtocolViolation;
use crate::rate_limited_warner::RateLimitedWarner;
use crate::state::Shared;

use super::backoff::ReconnectJitter;
use super::machine::{ConnectionState, Transition};
use super::ready::ReadySignal;

/// Control commands processed by the worker thread.
#[derive(Debug)]
pub enum Command {
    /// Connect now if disconnected.
    Connect,
    /// Close the channel and exit without reconnecting.
    Shutdown,
}

/// Message from the connection identified by `epoch`.
#[derive(Debug)]
pub struct Envelope {
    pub(crate) epoch: u64,
    pub(crate) event: InboundEvent,
}

enum Wakeup {
    Command(Result<Command, RecvError>),
    Inbound(Envelope),
    Reconnect,
}

/// Shared handles the worker needs besides the channel itself.
pub(crate) struct WorkerContext {
    pub(crate) shared: Arc<Shared>,
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) ready: ReadySignal,
}

pub(crate) fn spawn_worker<C: PushChannel>(
    channel: C,
    config: TailConfig,
    context: WorkerContext,
) -> (Sender<Command>, JoinHandle<()>) {
    let (tx, commands) = bounded(config.command_capacity);
    let (inbound_tx, inbound) = unbounded();
    let worker = Worker::new(channel, config, context, inbound_tx);
    let handle = thread::spawn(move || worker.run(commands, inbound));
    (tx, handle)
}

struct Worker<C> {
    channel: C,
    config: TailConfig,
    shared: Arc<Shared>,
    dispatcher: Arc<Dispatcher>,
    ready: ReadySignal,
    jitter: ReconnectJitter,
    warner: RateLimitedWarner,
    inbound_tx: Sender<Envelope>,
    epoch: u64,
    reconnect_at: Option<Instant>,
    /// Last connectivity reported to observers.
    announced: Option<bool>,
}

impl<C: PushChannel> Worker<C> {
    fn new(
        channel: C,
        config: TailConfig,
        context: WorkerContext,
        inbound_tx: Sender<Envelope>,
    ) -> Self {
        let jitter = match config.jitter_seed {
            Some(seed) => ReconnectJitter::with_seed(config.reconnect_max_delay, seed),
            None => ReconnectJitter::new(config.reconnect_max_delay),
        };
        let warner = RateLimitedWarner::new(config.warn_interval);
        Self {
            channel,
            config,
            shared: context.shared,
            dispatcher: context.dispatcher,
            ready: context.ready,
            jitter,
            warner,
            inbound_tx,
            epoch: 0,
            reconnect_at: None,
            announced: None,
        }
    }

    fn run(mut self, commands: Receiver<Command>, inbound: Receiver<Envelope>) {
        self.connect();
        loop {
            match self.next_wakeup(&commands, &inbound) {
                Wakeup::Reconnect => self.connect(),
                Wakeup::Inbound(Envelope { epoch, event }) => self.handle_inbound(epoch, event),
                Wakeup::Command(Ok(Command::Connect)) => self.connect(),
                Wakeup::Command(Ok(Command::Shutdown) | Err(_)) => break,
            }
        }
        self.shutdown();
    }

    /// Block until a command or inbound message arrives, or the pending
    /// reconnect delay elapses.
    fn next_wakeup(&self, commands: &Receiver<Command>, inbound: &Receiver<Envelope>) -> Wakeup {
        match self.reconnect_at {
            Some(deadline) => select! {
                recv(commands) -> command => Wakeup::Command(command),
                recv(inbound) -> envelope => match envelope {
                    Ok(envelope) => Wakeup::Inbound(envelope),
                    Err(err) => Wakeup::Command(Err(err)),
                },
                default(deadline.saturating_duration_since(Instant::now())) => Wakeup::Reconnect,
            },
            None => select! {
                recv(commands) -> command => Wakeup::Command(command),
                recv(inbound) -> envelope => match envelope {
                    Ok(envelope) => Wakeup::Inbound(envelope),
                    Err(err) => Wakeup::Command(Err(err)),
                },
            },
        }
    }

    fn state(&self) -> ConnectionState {
        self.shared.connection_state()
    }

    /// Apply `transition`, announcing entry to or exit from `Connected`.
    fn transition(&mut self, transition: Transition) -> bool {
        let current = self.state();
        let Some(next) = current.apply(transition) else {
            return false;
        };
        self.shared.set_connection_state(next);
        debug!("LogTailClient: {current} -> {next}");
        if current.is_connected() != next.is_connected() {
            self.announce(next.is_connected());
        }
        true
    }

    /// Tell observers about connectivity unless they already know it.
    fn announce(&mut self, connected: bool) {
        if self.announced == Some(connected) {
            return;
        }
        self.announced = Some(connected);
        self.dispatcher
            .dispatch(&TailEvent::ConnectionStateChanged(connected));
    }

    fn connect(&mut self) {
        if !self.transition(Transition::BeginConnect) {
            debug!("LogTailClient: connect ignored while {}", self.state());
            return;
        }
        self.reconnect_at = None;
        self.ready.set();
        if self.channel.state() != ChannelState::Disconnected {
            self.channel.close();
        }

        self.epoch += 1;
        let offset = {
            let mut state = self.shared.state.write();
            state.begin_connection();
            state.offset()
        };
        let sink = InboundSink::new(self.epoch, self.inbound_tx.clone());
        let result = self
            .channel
            .connect(sink)
            .and_then(|()| self.channel.subscribe(&self.config.subscription_id, offset));

        match result {
            Ok(()) => {
                info!(
                    "LogTailClient: subscribed to {} from offset {offset}",
                    self.config.subscription_id
                );
                self.transition(Transition::Established);
            }
            Err(err) => {
                warn!("LogTailClient failed to connect: {err}");
                self.channel.close();
                self.connection_lost();
                self.announce(false);
            }
        }
    }

    fn connection_lost(&mut self) {
        if !self.transition(Transition::Lost) {
            return;
        }
        let delay = self.jitter.next_delay();
        debug!("LogTailClient: reconnecting in {delay:?}");
        self.reconnect_at = Some(Instant::now() + delay);
    }

    fn handle_inbound(&mut self, epoch: u64, event: InboundEvent) {
        if epoch != self.epoch {
            debug!("LogTailClient: discarding message from stale connection {epoch}");
            return;
        }
        match event {
            InboundEvent::Closed { reason } => self.handle_closed(reason),
            _ if !self.state().is_connected() => {
                debug!("LogTailClient: discarding message received while {}", self.state());
            }
            InboundEvent::Initialize { loggers, entries } => self.apply_catch_up(loggers, entries),
            InboundEvent::LoggedEvent {
                formatted,
                event,
                sequence_id,
            } => self.accept_live(LogEntry::new(sequence_id, formatted, event)),
        }
    }

    fn handle_closed(&mut self, reason: Option<String>) {
        match self.state() {
            ConnectionState::Connecting | ConnectionState::Connected => {
                match reason {
                    Some(reason) => warn!("LogTailClient connection closed: {reason}"),
                    None => warn!("LogTailClient connection closed"),
                }
                self.channel.close();
                self.connection_lost();
            }
            _ => debug!("LogTailClient: ignoring close while {}", self.state()),
        }
    }

    fn apply_catch_up(&mut self, loggers: Vec<String>, entries: Vec<LogEntry>) {
        let applied = self
            .shared
            .state
            .write()
            .apply_catch_up(loggers, entries.into_iter().map(Arc::new));
        debug!(
            "LogTailClient: caught up with {} loggers and {} entries at offset {}",
            applied.loggers, applied.entries, applied.offset
        );
        self.dispatcher.dispatch(&TailEvent::CatchUp(applied));
    }

    fn accept_live(&mut self, entry: LogEntry) {
        let accepted = self.shared.state.write().accept_live(entry);
        match accepted {
            Ok(entry) => self.dispatcher.dispatch(&TailEvent::EntryReceived(entry)),
            Err(violation) => self.report_violation(violation),
        }
    }

    fn report_violation(&self, violation: ProtocolViolation) {
        self.warner.record_drop();
        self.warner.warn_if_due(|count| {
            warn!("LogTailClient dropped {count} out-of-order events; latest: {violation}");
        });
        self.dispatcher
            .dispatch(&TailEvent::ProtocolViolation(violation));
    }

    fn shutdown(&mut self) {
        self.reconnect_at = None;
        self.channel.close();
        self.transition(Transition::Stop);
        self.warner.flush(|count| {
            warn!("LogTailClient dropped {count} out-of-order events before stopping");
        });
    }
}
