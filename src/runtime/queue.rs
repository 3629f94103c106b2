//! Run queue of fibers that are ready to be polled.
//!
//! Wakers may fire from any thread (a cross-thread interrupt, for instance),
//! so pushes go through a mutex and unpark the loop when it is parked in the
//! reactor.

use crate::reactor::core::ReactorHandle;
use crate::task::Runnable;

use parking_lot::Mutex;

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A thread-safe FIFO of runnable tasks.
pub(crate) struct TaskQueue {
    queue: Mutex<VecDeque<Arc<dyn Runnable>>>,
    parked: AtomicBool,
    reactor: ReactorHandle,
}

impl TaskQueue {
    /// Creates an empty run queue that unparks `reactor` on push.
    pub(crate) fn new(capacity: usize, reactor: ReactorHandle) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            parked: AtomicBool::new(false),
            reactor,
        }
    }

    /// Enqueues a task at the back.
    pub(crate) fn push(&self, task: Arc<dyn Runnable>) {
        self.queue.lock().push_back(task);
        self.unpark();
    }

    /// Dequeues the next ready task.
    pub(crate) fn pop(&self) -> Option<Arc<dyn Runnable>> {
        self.queue.lock().pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Marks the loop as about to park. Pushes from now on notify the reactor.
    pub(crate) fn set_parked(&self, parked: bool) {
        self.parked.store(parked, Ordering::SeqCst);
    }

    /// Wakes the loop if it is parked.
    pub(crate) fn unpark(&self) {
        if self.parked.load(Ordering::SeqCst) {
            self.reactor.unpark();
        }
    }
}
