//! In-memory push channel driven by the test acting as the server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::channel::{ChannelState, InboundSink, PushChannel};
use crate::entry::LogEntry;
use crate::error::ChannelError;
use crate::offset::Offset;

/// Subscribe request observed by the scripted server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub subscription_id: String,
    pub since: Offset,
    pub epoch: u64,
    pub at: Instant,
}

#[derive(Debug)]
struct Script {
    state: ChannelState,
    sink: Option<InboundSink>,
    connect_attempts: Vec<Instant>,
    failing_connects: usize,
    failing_subscribes: usize,
    subscriptions: Vec<Subscription>,
    closes: usize,
    catch_up: Option<(Vec<String>, Vec<LogEntry>)>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            state: ChannelState::Disconnected,
            sink: None,
            connect_attempts: Vec::new(),
            failing_connects: 0,
            failing_subscribes: 0,
            subscriptions: Vec::new(),
            closes: 0,
            catch_up: None,
        }
    }
}

type SharedScript = Arc<(Mutex<Script>, Condvar)>;

/// Client end, handed to [`LogTailClient`](crate::LogTailClient).
#[derive(Debug)]
pub struct ScriptedChannel {
    script: SharedScript,
}

/// Server end, kept by the test.
#[derive(Clone, Debug)]
pub struct ScriptedRemote {
    script: SharedScript,
}

/// Create a connected pair of scripted channel and remote.
pub fn scripted_channel() -> (ScriptedChannel, ScriptedRemote) {
    let script: SharedScript = Arc::new((Mutex::new(Script::default()), Condvar::new()));
    (
        ScriptedChannel {
            script: Arc::clone(&script),
        },
        ScriptedRemote { script },
    )
}

impl PushChannel for ScriptedChannel {
    fn connect(&mut self, sink: InboundSink) -> Result<(), ChannelError> {
        let (lock, cvar) = &*self.script;
        let mut script = lock.lock();
        script.connect_attempts.push(Instant::now());
        cvar.notify_all();
        if script.failing_connects > 0 {
            script.failing_connects -= 1;
            return Err(ChannelError::Handshake("scripted handshake failure".into()));
        }
        script.state = ChannelState::Connected;
        script.sink = Some(sink);
        Ok(())
    }

    fn subscribe(&mut self, subscription_id: &str, since: Offset) -> Result<(), ChannelError> {
        let (lock, cvar) = &*self.script;
        let mut script = lock.lock();
        if script.failing_subscribes > 0 {
            script.failing_subscribes -= 1;
            return Err(ChannelError::Subscribe("scripted subscribe failure".into()));
        }
        let Some(sink) = script.sink.clone() else {
            return Err(ChannelError::Subscribe("not connected".into()));
        };
        script.subscriptions.push(Subscription {
            subscription_id: subscription_id.to_owned(),
            since,
            epoch: sink.epoch(),
            at: Instant::now(),
        });
        cvar.notify_all();
        let catch_up = script.catch_up.clone();
        drop(script);
        if let Some((loggers, entries)) = catch_up {
            sink.initialize(loggers, entries)?;
        }
        Ok(())
    }

    fn close(&mut self) {
        let (lock, cvar) = &*self.script;
        let mut script = lock.lock();
        if script.state != ChannelState::Disconnected {
            script.closes += 1;
        }
        script.state = ChannelState::Disconnected;
        script.sink = None;
        cvar.notify_all();
    }

    fn state(&self) -> ChannelState {
        self.script.0.lock().state
    }
}

impl ScriptedRemote {
    fn sink(&self) -> Option<InboundSink> {
        self.script.0.lock().sink.clone()
    }

    /// Fail the next `count` handshakes.
    pub fn fail_next_connects(&self, count: usize) {
        self.script.0.lock().failing_connects = count;
    }

    /// Fail the next `count` subscribe requests.
    pub fn fail_next_subscribes(&self, count: usize) {
        self.script.0.lock().failing_subscribes = count;
    }

    /// Answer every subscribe with this catch-up payload.
    pub fn serve_catch_up(&self, loggers: &[&str], entries: Vec<LogEntry>) {
        let loggers = loggers.iter().map(|name| (*name).to_owned()).collect();
        self.script.0.lock().catch_up = Some((loggers, entries));
    }

    /// Stop answering subscribes with a catch-up payload.
    pub fn clear_catch_up(&self) {
        self.script.0.lock().catch_up = None;
    }

    /// Send a catch-up payload on the current connection.
    pub fn initialize(&self, loggers: &[&str], entries: Vec<LogEntry>) -> bool {
        let loggers = loggers.iter().map(|name| (*name).to_owned()).collect();
        self.sink()
            .is_some_and(|sink| sink.initialize(loggers, entries).is_ok())
    }

    /// Push a live entry on the current connection.
    pub fn push(&self, entry: LogEntry) -> bool {
        self.sink().is_some_and(|sink| {
            sink.logged_event(entry.formatted, entry.event, entry.id)
                .is_ok()
        })
    }

    /// Sever the current connection, as a server restart would.
    pub fn drop_connection(&self, reason: &str) -> bool {
        let sink = {
            let mut script = self.script.0.lock();
            script.state = ChannelState::Disconnected;
            script.sink.take()
        };
        sink.is_some_and(|sink| sink.closed(Some(reason.to_owned())).is_ok())
    }

    /// Sink of the current connection, kept to simulate late messages.
    pub fn current_sink(&self) -> Option<InboundSink> {
        self.sink()
    }

    pub fn state(&self) -> ChannelState {
        self.script.0.lock().state
    }

    pub fn connect_attempts(&self) -> Vec<Instant> {
        self.script.0.lock().connect_attempts.clone()
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.script.0.lock().subscriptions.clone()
    }

    pub fn closes(&self) -> usize {
        self.script.0.lock().closes
    }

    /// Wait until at least `count` subscribe requests have been observed.
    pub fn wait_for_subscriptions(&self, count: usize, timeout: Duration) -> Vec<Subscription> {
        let (lock, cvar) = &*self.script;
        let mut script = lock.lock();
        cvar.wait_while_for(&mut script, |s| s.subscriptions.len() < count, timeout);
        script.subscriptions.clone()
    }

    /// Wait until at least `count` connect attempts have been observed.
    pub fn wait_for_connect_attempts(&self, count: usize, timeout: Duration) -> Vec<Instant> {
        let (lock, cvar) = &*self.script;
        let mut script = lock.lock();
        cvar.wait_while_for(&mut script, |s| s.connect_attempts.len() < count, timeout);
        script.connect_attempts.clone()
    }
}
