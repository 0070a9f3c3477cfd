//! Bridge emitting received entries as `tracing` events.

use std::sync::Arc;

use crate::dispatch::TailObserver;
use crate::entry::LogEntry;
use crate::level::Level;

/// Observer that records each entry as a `tracing` event.
///
/// `tracing` requires static targets, so the remote logger name travels in
/// the `logger` field instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl TailObserver for TracingObserver {
    fn on_entry_received(&self, entry: &Arc<LogEntry>) {
        let logger = entry.logger_name();
        let id = entry.id;
        let message = entry.message();
        match entry.level() {
            Level::Trace => tracing::trace!(target: "logtail", logger, id, "{message}"),
            Level::Debug => tracing::debug!(target: "logtail", logger, id, "{message}"),
            Level::Info => tracing::info!(target: "logtail", logger, id, "{message}"),
            Level::Warn => tracing::warn!(target: "logtail", logger, id, "{message}"),
            Level::Error | Level::Critical => {
                tracing::error!(target: "logtail", logger, id, "{message}")
            }
        }
    }

    fn on_connection_state_changed(&self, is_connected: bool) {
        tracing::info!(target: "logtail", is_connected, "log feed connection changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fmt;

    use parking_lot::Mutex;
    use rstest::rstest;
    use tracing::field::{Field, Visit};
    use tracing::span::{Attributes, Id, Record};
    use tracing::{Event, Metadata, Subscriber};

    use crate::test_utils::sample_entry;

    #[derive(Debug)]
    struct Captured {
        level: tracing::Level,
        target: String,
        fields: BTreeMap<String, String>,
    }

    #[derive(Clone, Default)]
    struct CapturingSubscriber {
        events: Arc<Mutex<Vec<Captured>>>,
    }

    struct FieldVisitor<'a>(&'a mut BTreeMap<String, String>);

    impl Visit for FieldVisitor<'_> {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_owned(), value.to_owned());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_owned(), format!("{value:?}"));
        }
    }

    impl Subscriber for CapturingSubscriber {
        fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
            true
        }

        fn new_span(&self, _span: &Attributes<'_>) -> Id {
            Id::from_u64(1)
        }

        fn record(&self, _span: &Id, _values: &Record<'_>) {}

        fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

        fn event(&self, event: &Event<'_>) {
            let mut fields = BTreeMap::new();
            event.record(&mut FieldVisitor(&mut fields));
            self.events.lock().push(Captured {
                level: *event.metadata().level(),
                target: event.metadata().target().to_owned(),
                fields,
            });
        }

        fn enter(&self, _span: &Id) {}

        fn exit(&self, _span: &Id) {}
    }

    #[rstest]
    fn entries_become_events_with_logger_and_id_fields() {
        let subscriber = CapturingSubscriber::default();
        let events = Arc::clone(&subscriber.events);
        let entry = Arc::new(sample_entry(7, "Db.Pool"));

        tracing::subscriber::with_default(subscriber, || {
            TracingObserver.on_entry_received(&entry);
            TracingObserver.on_connection_state_changed(false);
        });

        let events = events.lock();
        assert_eq!(events.len(), 2);
        let received = &events[0];
        assert_eq!(received.level, tracing::Level::INFO);
        assert_eq!(received.target, "logtail");
        assert_eq!(received.fields.get("logger").map(String::as_str), Some("Db.Pool"));
        assert_eq!(received.fields.get("id").map(String::as_str), Some("7"));
        assert_eq!(received.fields.get("message").map(String::as_str), Some("message 7"));
        assert_eq!(
            events[1].fields.get("is_connected").map(String::as_str),
            Some("false")
        );
    }
}
