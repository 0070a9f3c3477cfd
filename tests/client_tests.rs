//! End-to-end behaviour of the tail client through its public API.

use std::sync::Arc;
use std::time::Duration;

use logtail::test_utils::{CollectingObserver, sample_entry, scripted_channel, wait_until};
use logtail::{
    ConnectionState, EntryFormatter, LogEntry, LogTailClient, Offset, ServerTextFormatter,
    TailClientBuilder, TailObserver,
};
use rstest::rstest;

const WAIT: Duration = Duration::from_secs(2);

const SERVER_ENTRY: &str = r#"{
    "id": 7,
    "loggingEvent": {
        "level": "ERROR",
        "loggerName": "GameServer.Persistence",
        "timeStamp": "2024-05-04T08:00:00Z",
        "message": "save failed"
    }
}"#;

#[rstest]
fn client_built_from_ini_tails_the_feed() {
    let builder = TailClientBuilder::from_ini_str(
        "inline",
        "[logtail]\ncapacity = 2\nsubscription_id = Ops\nreconnect_max_delay_ms = 25\n",
    )
    .expect("parse config");
    let (channel, remote) = scripted_channel();
    remote.serve_catch_up(&["GameServer.Persistence"], Vec::new());
    let observer = CollectingObserver::new();
    let client = builder
        .build_observed(channel, vec![Arc::new(observer.clone())])
        .expect("build client");

    assert_eq!(client.capacity().get(), 2);
    let subscriptions = remote.wait_for_subscriptions(1, WAIT);
    assert_eq!(subscriptions[0].subscription_id, "Ops");
    assert!(wait_until(WAIT, || !observer.catch_ups().is_empty()));

    let decoded = LogEntry::from_json(SERVER_ENTRY).expect("decode entry");
    for id in [5, 6] {
        assert!(remote.push(sample_entry(id, "GameServer.Persistence")));
    }
    assert!(remote.push(decoded));
    assert!(wait_until(WAIT, || client.offset() == Offset::new(7)));

    let snapshot = client.snapshot();
    let ids: Vec<u64> = snapshot.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![6, 7]);
    assert_eq!(
        ServerTextFormatter.format(&snapshot[1]),
        "2024-05-04T08:00:00.000Z ERROR GameServer.Persistence - save failed"
    );
}

#[rstest]
fn observers_can_join_and_leave_while_running() {
    let (channel, remote) = scripted_channel();
    remote.serve_catch_up(&[], Vec::new());
    let early = CollectingObserver::new();
    let client = LogTailClient::start(
        channel,
        TailClientBuilder::new()
            .build_config()
            .expect("default config"),
        vec![Arc::new(early.clone())],
    );
    assert!(wait_until(WAIT, || !early.catch_ups().is_empty()));

    assert!(remote.push(sample_entry(1, "core")));
    assert!(wait_until(WAIT, || early.entry_ids() == vec![1]));

    let late = CollectingObserver::new();
    let late_id = client.subscribe(Arc::new(late.clone()) as Arc<dyn TailObserver>);
    assert!(remote.push(sample_entry(2, "core")));
    assert!(wait_until(WAIT, || late.entry_ids() == vec![2]));

    assert!(client.unsubscribe(late_id));
    assert!(!client.unsubscribe(late_id));
    assert!(remote.push(sample_entry(3, "core")));
    assert!(wait_until(WAIT, || early.entry_ids() == vec![1, 2, 3]));
    assert_eq!(late.entry_ids(), vec![2]);
}

#[rstest]
fn panicking_observer_does_not_stop_delivery() {
    struct Panicking;

    impl TailObserver for Panicking {
        fn on_entry_received(&self, _entry: &Arc<LogEntry>) {
            panic!("observer failure");
        }
    }

    let (channel, remote) = scripted_channel();
    remote.serve_catch_up(&[], Vec::new());
    let observer = CollectingObserver::new();
    let client = LogTailClient::start(
        channel,
        TailClientBuilder::new()
            .build_config()
            .expect("default config"),
        vec![Arc::new(Panicking), Arc::new(observer.clone())],
    );
    assert!(wait_until(WAIT, || !observer.catch_ups().is_empty()));

    for id in 1..=3 {
        assert!(remote.push(sample_entry(id, "core")));
    }
    assert!(wait_until(WAIT, || observer.entry_ids() == vec![1, 2, 3]));
    assert!(client.is_connected());
}

#[rstest]
fn dropping_the_client_closes_the_channel() {
    let (channel, remote) = scripted_channel();
    remote.serve_catch_up(&[], Vec::new());
    let client = LogTailClient::new(channel);
    remote.wait_for_subscriptions(1, WAIT);
    assert!(wait_until(WAIT, || client.state() == ConnectionState::Connected));

    drop(client);
    assert_eq!(remote.closes(), 1);
    assert!(!remote.push(sample_entry(1, "core")));
}
