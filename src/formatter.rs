use chrono::SecondsFormat;

use crate::entry::LogEntry;

/// Trait for rendering log entries into display strings.
///
/// Implementors must be thread-safe (`Send + Sync`) so formatters can be
/// shared with observers running on the client's worker thread.
pub trait EntryFormatter: Send + Sync {
    /// Format an entry into a string representation.
    fn format(&self, entry: &LogEntry) -> String;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultFormatter;

impl EntryFormatter for DefaultFormatter {
    fn format(&self, entry: &LogEntry) -> String {
        let event = &entry.event;
        let mut line = format!(
            "{} {} {} - {}",
            event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            event.level,
            event.logger_name,
            event.message
        );
        if let Some(exception) = &event.exception {
            line.push('\n');
            line.push_str(exception);
        }
        line
    }
}

/// Formatter that keeps the server-rendered text and falls back to
/// [`DefaultFormatter`] for entries without one.
#[derive(Copy, Clone, Debug, Default)]
pub struct ServerTextFormatter;

impl EntryFormatter for ServerTextFormatter {
    fn format(&self, entry: &LogEntry) -> String {
        entry.to_string()
    }
}
