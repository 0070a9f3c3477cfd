//! Compatibility bridge for the Rust `log` crate.
//!
//! [`LogObserver`] re-emits every received entry through the `log` facade,
//! so a tail can be piped into whatever logger the host application has
//! installed. The remote logger name becomes the record target and the
//! remote level is mapped with [`Level::to_log_level`].
//!
//! [`Level::to_log_level`]: crate::level::Level::to_log_level

use std::sync::Arc;

use log::Record;

use crate::dispatch::TailObserver;
use crate::entry::LogEntry;
use crate::formatter::{DefaultFormatter, EntryFormatter};

/// Observer forwarding entries to the global `log` logger.
pub struct LogObserver {
    formatter: Box<dyn EntryFormatter>,
    target_prefix: Option<String>,
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl LogObserver {
    pub fn new() -> Self {
        Self::with_formatter(DefaultFormatter)
    }

    pub fn with_formatter(formatter: impl EntryFormatter + 'static) -> Self {
        Self {
            formatter: Box::new(formatter),
            target_prefix: None,
        }
    }

    /// Prefix record targets, e.g. `remote` yields `remote::Db.Pool`.
    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefix = Some(prefix.into());
        self
    }

    fn target(&self, entry: &LogEntry) -> String {
        match &self.target_prefix {
            Some(prefix) => format!("{prefix}::{}", entry.logger_name()),
            None => entry.logger_name().to_owned(),
        }
    }
}

fn is_enabled_by_global_max(level: log::Level) -> bool {
    log::max_level() >= level.to_level_filter()
}

impl TailObserver for LogObserver {
    fn on_entry_received(&self, entry: &Arc<LogEntry>) {
        let level = entry.level().to_log_level();
        if !is_enabled_by_global_max(level) {
            return;
        }
        let target = self.target(entry);
        let message = self.formatter.format(entry);
        log::logger().log(
            &Record::builder()
                .args(format_args!("{message}"))
                .level(level)
                .target(&target)
                .build(),
        );
    }
}
