//! Seam between the client and the transport library.
//!
//! A [`PushChannel`] owns the network connection, framing, and method
//! invocation. The client drives it from a single worker thread and receives
//! server messages through the [`InboundSink`] handed over on every
//! successful `connect`.

use crossbeam_channel::Sender;

use crate::client::worker::Envelope;
use crate::entry::{LogEntry, LogEventData};
use crate::error::ChannelError;
use crate::offset::Offset;

/// Connection state reported by a transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

/// Transport collaborator consumed by [`LogTailClient`](crate::LogTailClient).
///
/// Implementations must deliver every server message for a connection to
/// the sink passed to `connect`, and report loss of the connection through
/// [`InboundSink::closed`]. The sink may be used from any thread.
pub trait PushChannel: Send + 'static {
    /// Open the connection. Inbound messages go to `sink` until `close`.
    fn connect(&mut self, sink: InboundSink) -> Result<(), ChannelError>;

    /// Ask the server for events strictly after `since`.
    fn subscribe(&mut self, subscription_id: &str, since: Offset) -> Result<(), ChannelError>;

    /// Close the connection. Must be idempotent.
    fn close(&mut self);

    fn state(&self) -> ChannelState;
}

/// Server message delivered through an [`InboundSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    /// Known loggers and cached entries, sent once per connection.
    Initialize {
        loggers: Vec<String>,
        entries: Vec<LogEntry>,
    },
    /// A live entry.
    LoggedEvent {
        formatted: String,
        event: LogEventData,
        sequence_id: u64,
    },
    /// The connection was lost.
    Closed { reason: Option<String> },
}

/// Delivers inbound messages for one connection to the client.
///
/// Each sink is tagged with the connection it was issued for; messages sent
/// through a sink from an earlier connection are discarded by the client.
/// The queue behind a sink is unbounded: sends never block, so a sink may
/// be used from inside [`PushChannel`] calls and no entry is lost.
#[derive(Clone, Debug)]
pub struct InboundSink {
    epoch: u64,
    tx: Sender<Envelope>,
}

impl InboundSink {
    pub(crate) fn new(epoch: u64, tx: Sender<Envelope>) -> Self {
        Self { epoch, tx }
    }

    /// Connection counter this sink belongs to.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn send(&self, event: InboundEvent) -> Result<(), ChannelError> {
        self.tx
            .send(Envelope {
                epoch: self.epoch,
                event,
            })
            .map_err(|_| ChannelError::ClientStopped)
    }

    pub fn initialize(
        &self,
        loggers: Vec<String>,
        entries: Vec<LogEntry>,
    ) -> Result<(), ChannelError> {
        self.send(InboundEvent::Initialize { loggers, entries })
    }

    pub fn logged_event(
        &self,
        formatted: impl Into<String>,
        event: LogEventData,
        sequence_id: u64,
    ) -> Result<(), ChannelError> {
        self.send(InboundEvent::LoggedEvent {
            formatted: formatted.into(),
            event,
            sequence_id,
        })
    }

    pub fn closed(&self, reason: Option<String>) -> Result<(), ChannelError> {
        self.send(InboundEvent::Closed { reason })
    }
}
