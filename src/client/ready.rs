//! One-shot signal raised once the first connect attempt has been issued.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Cloneable, waitable flag. It reports that connecting has started, not
/// that it succeeded.
#[derive(Clone, Debug, Default)]
pub struct ReadySignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl ReadySignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&self) {
        let (flag, cvar) = &*self.inner;
        let mut ready = flag.lock();
        if !*ready {
            *ready = true;
            cvar.notify_all();
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Block until the signal is raised.
    pub fn wait(&self) {
        let (flag, cvar) = &*self.inner;
        let mut ready = flag.lock();
        while !*ready {
            cvar.wait(&mut ready);
        }
    }

    /// Block for at most `timeout`. Returns whether the signal was raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let mut ready = flag.lock();
        if !*ready {
            cvar.wait_while_for(&mut ready, |ready| !*ready, timeout);
        }
        *ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn wait_returns_after_set_from_another_thread() {
        let signal = ReadySignal::new();
        let setter = signal.clone();
        let handle = thread::spawn(move || setter.set());
        signal.wait();
        assert!(signal.is_ready());
        handle.join().expect("setter thread");
    }

    #[test]
    fn wait_timeout_reports_unset_signal() {
        let signal = ReadySignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(10)));
    }
}
