//! Real-time log tail over a push-based log feed.
//!
//! [`LogTailClient`] keeps a long-lived subscription open through a
//! [`PushChannel`], recovers from disconnects by resubscribing from the
//! offset of the last accepted entry, and exposes a bounded, continuously
//! updated window of recent entries to observers.

pub mod buffer;
pub mod channel;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod entry;
pub mod error;
mod file_config;
pub mod formatter;
pub mod level;
#[cfg(feature = "log-compat")]
pub mod log_compat;
pub mod offset;
pub mod rate_limited_warner;
pub mod state;
#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;
#[cfg(feature = "tracing-compat")]
pub mod tracing_compat;

pub use buffer::{DEFAULT_BUFFER_CAPACITY, EntryBuffer};
pub use channel::{ChannelState, InboundEvent, InboundSink, PushChannel};
pub use client::{ConnectionState, LogTailClient, ReadySignal, ReconnectJitter, Transition};
pub use config::{TailClientBuilder, TailConfig};
pub use dispatch::{Dispatcher, ObserverId, TailEvent, TailObserver};
pub use entry::{LogEntry, LogEventData};
pub use error::{BuildError, ChannelError, ProtocolViolation};
pub use file_config::CONFIG_SECTION;
pub use formatter::{DefaultFormatter, EntryFormatter, ServerTextFormatter};
pub use level::Level;
#[cfg(feature = "log-compat")]
pub use log_compat::LogObserver;
pub use offset::{Offset, OffsetTracker};
pub use state::{CatchUpApplied, CatchUpSnapshot, TailState, TailView};
#[cfg(feature = "tracing-compat")]
pub use tracing_compat::TracingObserver;
