//! Single-threaded runtime: executor, reactor and timers driven by `block_on`.
//!
//! Each loop turn polls the main future, runs ready fibers, dispatches reactor
//! wakes, fires expired timers, and parks in the reactor when nothing is
//! runnable.

use crate::builder::RuntimeBuilder;
use crate::error::Result;
use crate::reactor::core::Reactor;
use crate::runtime::context::{enter_context, with_fiber};
use crate::runtime::executor::Executor;
use crate::runtime::fiber::Fiber;
use crate::runtime::queue::TaskQueue;
use crate::task::{JoinHandle, Task};
use crate::timer;

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;

/// The event loop. Owns the run queue, the executor and the reactor.
pub struct Runtime {
    queue: Arc<TaskQueue>,
    executor: Executor,
    reactor: Reactor,
    idle_timeout: Option<Duration>,
}

impl Runtime {
    /// Creates a runtime with the default configuration.
    ///
    /// # Errors
    /// Fails if the reactor's notifier pipe cannot be created.
    ///
    /// # Example
    /// ```ignore
    /// let mut rt = Runtime::new()?;
    /// ```
    pub fn new() -> Result<Self> {
        RuntimeBuilder::new().build()
    }

    pub(crate) fn with_config(
        run_queue_capacity: usize,
        event_interval: usize,
        idle_timeout: Option<Duration>,
    ) -> Result<Self> {
        let reactor = Reactor::new()?;
        let queue = Arc::new(TaskQueue::new(run_queue_capacity, reactor.handle()));
        let executor = Executor::new(queue.clone(), event_interval);

        Ok(Self {
            queue,
            executor,
            reactor,
            idle_timeout,
        })
    }

    /// Spawns a task that will run once `block_on` drives the loop.
    ///
    /// # Arguments
    /// * `fut` - The future to run as a new fiber
    ///
    /// # Returns
    /// A [`JoinHandle`] resolving to the future's output
    ///
    /// # Example
    /// ```ignore
    /// rt.spawn(async {
    ///     println!("Background task");
    /// });
    /// ```
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        Task::spawn_on(fut, self.queue.clone())
    }

    /// Runs `fut` to completion as the root fiber, driving spawned fibers,
    /// reactor wakes and timers along the way.
    ///
    /// Fibers still runnable when `fut` completes get one more pass of the
    /// executor; fibers parked at that point stay parked until the next
    /// `block_on`.
    ///
    /// # Errors
    /// Fails if parking in the reactor fails.
    ///
    /// # Example
    /// ```ignore
    /// let result = rt.block_on(async { 42 })?;
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F: Future>(&mut self, fut: F) -> Result<F::Output> {
        let root = Fiber::new();
        let notify = Arc::new(RootWake {
            notified: AtomicBool::new(true),
            queue: self.queue.clone(),
        });
        let waker = Waker::from(notify.clone());

        enter_context(self.queue.clone(), self.reactor.handle(), || {
            let mut fut = pin!(fut);
            let mut cx = Context::from_waker(&waker);

            loop {
                if notify.notified.swap(false, Ordering::AcqRel) {
                    if let Poll::Ready(val) = with_fiber(&root, || fut.as_mut().poll(&mut cx)) {
                        self.executor.run();
                        return Ok(val);
                    }
                }

                self.executor.run();

                self.reactor.poll_events();

                timer::process_timers();

                if notify.notified.load(Ordering::Acquire) || !self.queue.is_empty() {
                    continue;
                }

                self.park(&notify)?;
            }
        })
    }

    // Blocks in the reactor until something becomes runnable or the next
    // timer is due.
    fn park(&self, notify: &RootWake) -> Result<()> {
        self.queue.set_parked(true);

        if notify.notified.load(Ordering::Acquire) || !self.queue.is_empty() {
            self.queue.set_parked(false);
            return Ok(());
        }

        let timeout = match (timer::next_timer_remaining(), self.idle_timeout) {
            (Some(next), Some(idle)) => Some(next.min(idle)),
            (next, idle) => next.or(idle),
        };

        let res = self.reactor.wait_for_event(timeout);
        self.queue.set_parked(false);
        res?;

        Ok(())
    }
}

// Waker of the root fiber: flags the main future for polling.
struct RootWake {
    notified: AtomicBool,
    queue: Arc<TaskQueue>,
}

impl Wake for RootWake {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.notified.store(true, Ordering::Release);
        self.queue.unpark();
    }
}
