//! Test helpers shared by unit tests and, through the `test-util` feature,
//! by integration tests.
//!
//! [`scripted_channel`] returns a [`PushChannel`](crate::channel::PushChannel)
//! double together with the remote end that tests use to play the server.

mod collecting_observer;
mod scripted_channel;

use std::thread;
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};

use crate::entry::{LogEntry, LogEventData};
use crate::level::Level;

pub use collecting_observer::CollectingObserver;
pub use scripted_channel::{ScriptedChannel, ScriptedRemote, Subscription, scripted_channel};

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(2));
    }
}

/// Entry with a deterministic payload derived from `id`.
pub fn sample_entry(id: u64, logger: &str) -> LogEntry {
    let timestamp = Utc
        .timestamp_opt(1_700_000_000 + id as i64, 0)
        .single()
        .unwrap_or_default();
    LogEntry::new(
        id,
        format!("{logger} #{id}"),
        LogEventData::at(logger, Level::Info, &format!("message {id}"), timestamp),
    )
}
