//! Send/Sync guarantees for core types.

use logtail::{
    Dispatcher, EntryBuffer, LogEntry, LogTailClient, ReadySignal, TailClientBuilder, TailConfig,
    TailView,
};
use rstest::rstest;
use static_assertions::assert_impl_all;

#[rstest]
fn builders_are_send_sync() {
    assert_impl_all!(TailClientBuilder: Send, Sync, Clone);
    assert_impl_all!(TailConfig: Send, Sync, Clone);
}

#[rstest]
fn components_are_send_sync() {
    assert_impl_all!(LogTailClient: Send, Sync);
    assert_impl_all!(TailView: Send, Sync, Clone);
    assert_impl_all!(ReadySignal: Send, Sync, Clone);
    assert_impl_all!(Dispatcher: Send, Sync);
    assert_impl_all!(EntryBuffer: Send, Sync);
    assert_impl_all!(LogEntry: Send, Sync);
}
