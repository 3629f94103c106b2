//! Wake-source registry and dispatch for the single-threaded event loop.
//!
//! A watcher is anything implementing [`Watch`]. Once registered it can be
//! woken from any thread through [`ReactorHandle::send`]; the loop thread later
//! runs [`ReactorHandle::dispatch`], which invokes `on_wake` exactly once per
//! watcher no matter how many sends arrived in between.

use crate::reactor::notifier::Notifier;

use parking_lot::Mutex;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// A wake source registered with the reactor.
///
/// The callback carries no payload: anything to deliver travels through the
/// watcher's own state.
pub(crate) trait Watch: Send + Sync {
    fn on_wake(&self);
}

/// Identifier of a registered watcher. Never reused within one reactor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct WatchKey(u64);

struct Shared {
    watchers: Mutex<HashMap<WatchKey, Weak<dyn Watch>>>,
    pending: Mutex<Vec<WatchKey>>,
    next_key: AtomicU64,
    notifier: Notifier,
}

/// Cloneable, thread-safe handle to a reactor.
#[derive(Clone)]
pub(crate) struct ReactorHandle {
    shared: Arc<Shared>,
}

impl ReactorHandle {
    /// Registers a watcher. The reactor only keeps a weak reference, so a
    /// dropped watcher is pruned on the next dispatch.
    pub(crate) fn register(&self, watcher: Weak<dyn Watch>) -> WatchKey {
        let key = WatchKey(self.shared.next_key.fetch_add(1, Ordering::Relaxed));
        self.shared.watchers.lock().insert(key, watcher);

        key
    }

    /// Removes a watcher. Unknown keys are ignored.
    pub(crate) fn unregister(&self, key: WatchKey) {
        self.shared.watchers.lock().remove(&key);
    }

    /// Requests that `key`'s callback runs on the next dispatch.
    ///
    /// Callable from any thread. Sends to unregistered keys are dropped at
    /// dispatch time.
    pub(crate) fn send(&self, key: WatchKey) {
        self.shared.pending.lock().push(key);
        self.shared.notifier.notify();
    }

    /// Wakes a parked loop without delivering anything.
    pub(crate) fn unpark(&self) {
        self.shared.notifier.notify();
    }

    /// Runs the callbacks of every watcher woken since the last dispatch, in
    /// the order of their first send. Returns how many callbacks ran.
    pub(crate) fn dispatch(&self) -> usize {
        let pending = std::mem::take(&mut *self.shared.pending.lock());
        if pending.is_empty() {
            return 0;
        }

        let mut seen = HashSet::with_capacity(pending.len());
        let mut fired = 0;

        for key in pending {
            if !seen.insert(key) {
                continue;
            }

            // no lock held while the callback runs: it usually unregisters itself
            let watcher = {
                let mut watchers = self.shared.watchers.lock();
                match watchers.get(&key).map(Weak::upgrade) {
                    Some(Some(watcher)) => watcher,
                    Some(None) => {
                        watchers.remove(&key);
                        continue;
                    }
                    None => continue,
                }
            };

            watcher.on_wake();
            fired += 1;
        }

        fired
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.shared.pending.lock().is_empty()
    }

    /// Number of registered watchers.
    pub(crate) fn active_count(&self) -> usize {
        self.shared.watchers.lock().len()
    }
}

impl fmt::Debug for ReactorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactorHandle")
            .field("watchers", &self.active_count())
            .finish_non_exhaustive()
    }
}

/// The loop-side half of the reactor, owned by the runtime.
pub(crate) struct Reactor {
    handle: ReactorHandle,
}

impl Reactor {
    pub(crate) fn new() -> io::Result<Self> {
        let shared = Arc::new(Shared {
            watchers: Mutex::new(HashMap::new()),
            pending: Mutex::new(Vec::new()),
            next_key: AtomicU64::new(1),
            notifier: Notifier::new()?,
        });

        Ok(Self {
            handle: ReactorHandle { shared },
        })
    }

    pub(crate) fn handle(&self) -> ReactorHandle {
        self.handle.clone()
    }

    /// Dispatches pending wakes without blocking.
    pub(crate) fn poll_events(&self) -> usize {
        self.handle.dispatch()
    }

    /// Parks the loop until notified or `timeout` elapses, then dispatches.
    pub(crate) fn wait_for_event(&self, timeout: Option<Duration>) -> io::Result<usize> {
        if !self.handle.has_pending() {
            self.handle.shared.notifier.wait(timeout)?;
        }

        Ok(self.handle.dispatch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    struct Counter(AtomicUsize);

    impl Watch for Counter {
        fn on_wake(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counter() -> Arc<Counter> {
        Arc::new(Counter(AtomicUsize::new(0)))
    }

    #[test]
    fn repeated_sends_fire_once() {
        let reactor = Reactor::new().unwrap();
        let handle = reactor.handle();
        let watcher = counter();

        let key = handle.register(Arc::downgrade(&watcher) as Weak<dyn Watch>);
        handle.send(key);
        handle.send(key);
        handle.send(key);

        assert_eq!(reactor.poll_events(), 1);
        assert_eq!(watcher.0.load(Ordering::SeqCst), 1);
        assert_eq!(reactor.poll_events(), 0);
    }

    #[test]
    fn unregistered_and_dropped_watchers_are_skipped() {
        let reactor = Reactor::new().unwrap();
        let handle = reactor.handle();

        let kept = counter();
        let kept_key = handle.register(Arc::downgrade(&kept) as Weak<dyn Watch>);
        handle.unregister(kept_key);
        handle.send(kept_key);

        let dropped = counter();
        let dropped_key = handle.register(Arc::downgrade(&dropped) as Weak<dyn Watch>);
        drop(dropped);
        handle.send(dropped_key);

        assert_eq!(reactor.poll_events(), 0);
        assert_eq!(kept.0.load(Ordering::SeqCst), 0);
        assert_eq!(handle.active_count(), 0);
    }

    #[test]
    fn wait_returns_after_cross_thread_send() {
        let reactor = Reactor::new().unwrap();
        let handle = reactor.handle();
        let watcher = counter();
        let key = handle.register(Arc::downgrade(&watcher) as Weak<dyn Watch>);

        let remote = handle.clone();
        let thread = std::thread::spawn(move || remote.send(key));

        let mut fired = 0;
        while fired == 0 {
            fired = reactor.wait_for_event(Some(Duration::from_secs(5))).unwrap();
        }
        thread.join().unwrap();

        assert_eq!(watcher.0.load(Ordering::SeqCst), 1);
    }
}
