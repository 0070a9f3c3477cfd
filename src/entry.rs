//! Log entries received from the push feed.
//!
//! A [`LogEntry`] pairs the server-assigned sequence id with the structured
//! [`LogEventData`] payload and the display text the server rendered for it.
//! Entries are immutable once built; the client shares them as
//! `Arc<LogEntry>` so snapshots never copy payloads.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::formatter::{DefaultFormatter, EntryFormatter};
use crate::level::Level;

/// Structured payload of a remote log event.
///
/// Field names follow the server's JSON encoding so transport adapters can
/// hand payloads straight to `serde_json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEventData {
    pub level: Level,
    pub logger_name: String,
    #[serde(rename = "timeStamp")]
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Rendered exception, when the event carried one.
    #[serde(default, rename = "exceptionString", skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl LogEventData {
    /// Build a payload stamped with the current time.
    pub fn new(logger_name: &str, level: Level, message: &str) -> Self {
        Self::at(logger_name, level, message, Utc::now())
    }

    /// Build a payload with an explicit timestamp.
    pub fn at(logger_name: &str, level: Level, message: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            level,
            logger_name: logger_name.to_owned(),
            timestamp,
            message: message.to_owned(),
            exception: None,
            thread_name: None,
            properties: BTreeMap::new(),
        }
    }

    /// Attach rendered exception text.
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Attach the name of the thread that produced the event.
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = Some(thread_name.into());
        self
    }

    /// Attach a key/value property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A log event with its server-assigned sequence id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Monotonically increasing id assigned by the server.
    pub id: u64,
    /// Display text rendered by the server; empty when none was sent.
    #[serde(default)]
    pub formatted: String,
    #[serde(rename = "loggingEvent")]
    pub event: LogEventData,
}

impl LogEntry {
    pub fn new(id: u64, formatted: impl Into<String>, event: LogEventData) -> Self {
        Self {
            id,
            formatted: formatted.into(),
            event,
        }
    }

    /// Entry without server-rendered text, as found in catch-up caches.
    pub fn unformatted(id: u64, event: LogEventData) -> Self {
        Self::new(id, String::new(), event)
    }

    pub fn level(&self) -> Level {
        self.event.level
    }

    pub fn logger_name(&self) -> &str {
        &self.event.logger_name
    }

    pub fn message(&self) -> &str {
        &self.event.message
    }

    /// Decode a single entry from its JSON representation.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.formatted.is_empty() {
            f.write_str(&DefaultFormatter.format(self))
        } else {
            f.write_str(&self.formatted)
        }
    }
}
