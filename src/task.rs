//! Tasks: futures scheduled as fibers on the runtime.
//!
//! Every spawned future gets its own [`Fiber`], installed as the current fiber
//! while the executor polls it. Blocking primitives ([`Async`](crate::Async),
//! [`Queue`](crate::Queue), [`sleep`](crate::sleep)) park that fiber, and
//! whoever resumes it wakes the task back onto the run queue.
//!
//! # Task Spawning
//!
//! ```ignore
//! use coop_reactor::Task;
//!
//! async fn spawn_example() {
//!     let handle = Task::spawn(async { 42 });
//!     assert_eq!(handle.await, 42);
//! }
//! ```
//!
//! # Interrupting a task
//!
//! [`JoinHandle::interrupt`] resumes the task's fiber with an error-shaped
//! value. The blocking call it is parked in unwinds and returns the
//! [`Interrupt`] to the task's code.
//!
//! ```ignore
//! use coop_reactor::{Interrupt, Queue, Task};
//! use std::rc::Rc;
//!
//! async fn cancel_consumer() {
//!     let queue = Rc::new(Queue::<u32>::new());
//!     let consumer = {
//!         let queue = queue.clone();
//!         Task::spawn(async move { queue.shift().await })
//!     };
//!     coop_reactor::yield_now().await;
//!
//!     consumer.cancel();
//!     assert_eq!(consumer.await, Err(Interrupt::Cancel));
//! }
//! ```

use crate::error::Interrupt;
use crate::runtime::context;
use crate::runtime::fiber::Fiber;
use crate::runtime::queue::TaskQueue;
use crate::runtime::waker::make_waker;

use parking_lot::Mutex;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};

/// A spawned future together with its fiber and completion state.
///
/// Created through [`Task::spawn`] or `Runtime::spawn`.
pub struct Task<T> {
    future: Mutex<Option<Pin<Box<dyn Future<Output = T>>>>>,
    result: Mutex<Option<T>>,
    queue: Arc<TaskQueue>,
    fiber: Fiber,
    completed: AtomicBool,
    waiters: Mutex<Vec<Waker>>,
}

// The future is only ever polled on the loop thread, under its mutex. Other
// threads reach a task through its waker, which only pushes it onto the run
// queue.
unsafe impl<T> Send for Task<T> {}
unsafe impl<T> Sync for Task<T> {}

impl<T: 'static> Task<T> {
    pub(crate) fn new<F>(fut: F, queue: Arc<TaskQueue>) -> Arc<Self>
    where
        F: Future<Output = T> + 'static,
    {
        Arc::new(Task {
            future: Mutex::new(Some(Box::pin(fut))),
            result: Mutex::new(None),
            queue,
            fiber: Fiber::new(),
            completed: AtomicBool::new(false),
            waiters: Mutex::new(Vec::new()),
        })
    }

    /// Polls the task's future once inside its fiber context.
    ///
    /// On completion the output is stored for the [`JoinHandle`] and every
    /// waiter is woken. Polling a completed task does nothing.
    pub fn poll(self: &Arc<Self>) {
        let runnable: Arc<dyn Runnable> = self.clone();
        let waker = make_waker(runnable);
        let mut context = Context::from_waker(&waker);

        let mut future_slot = self.future.lock();

        if let Some(mut future) = future_slot.take() {
            match context::with_fiber(&self.fiber, || future.as_mut().poll(&mut context)) {
                Poll::Pending => {
                    *future_slot = Some(future);
                }
                Poll::Ready(val) => {
                    drop(future_slot);
                    // drop the future before publishing, so its guards have run
                    drop(future);

                    *self.result.lock() = Some(val);

                    let waiters = {
                        let mut waiters = self.waiters.lock();
                        self.completed.store(true, Ordering::Release);
                        std::mem::take(&mut *waiters)
                    };
                    for w in waiters {
                        w.wake();
                    }
                }
            }
        }
    }

    /// Spawns a task on the current runtime and returns a [`JoinHandle`].
    ///
    /// # Panics
    /// Panics if called outside of a runtime context.
    pub fn spawn<F>(future: F) -> JoinHandle<T>
    where
        F: Future<Output = T> + 'static,
    {
        let queue =
            context::current_queue().expect("Task::spawn() called outside of a runtime context");

        Self::spawn_on(future, queue)
    }

    pub(crate) fn spawn_on<F>(future: F, queue: Arc<TaskQueue>) -> JoinHandle<T>
    where
        F: Future<Output = T> + 'static,
    {
        let task: Arc<Task<T>> = Task::new(future, queue.clone());
        let runnable: Arc<dyn Runnable> = task.clone();

        queue.push(runnable);

        JoinHandle { task }
    }
}

/// Objects the executor can poll and the waker can re-queue.
pub(crate) trait Runnable: Send + Sync {
    /// Polls the task for progress.
    fn run(self: Arc<Self>);

    /// Pushes the task back onto its run queue.
    fn schedule(self: Arc<Self>);
}

impl<T: 'static> Runnable for Task<T> {
    fn run(self: Arc<Self>) {
        Task::poll(&self);
    }

    fn schedule(self: Arc<Self>) {
        if self.completed.load(Ordering::Acquire) {
            return;
        }

        let queue = self.queue.clone();
        queue.push(self);
    }
}

/// Awaitable handle to a spawned task; resolves to the task's output.
///
/// Dropping the handle detaches the task, it keeps running.
pub struct JoinHandle<T> {
    task: Arc<Task<T>>,
}

impl<T> JoinHandle<T> {
    /// The fiber running the task.
    ///
    /// The handle is `Send`, so the task can be interrupted from another
    /// thread through it.
    pub fn fiber(&self) -> Fiber {
        self.task.fiber.clone()
    }

    /// Resumes the task's fiber with `reason` at its current (or next)
    /// switchpoint.
    ///
    /// # Arguments
    /// * `reason` - Returned as `Err` by the blocking call the task is in
    ///
    /// # Example
    /// ```ignore
    /// let sleeper = Task::spawn(async { sleep(Duration::from_secs(60)).await });
    /// yield_now().await;
    /// sleeper.interrupt(Interrupt::Stop);
    /// assert_eq!(sleeper.await, Err(Interrupt::Stop));
    /// ```
    pub fn interrupt(&self, reason: Interrupt) {
        self.task.fiber.interrupt(reason);
    }

    /// Shorthand for `interrupt(Interrupt::Cancel)`.
    pub fn cancel(&self) {
        self.interrupt(Interrupt::Cancel);
    }

    /// Whether the task has produced its output.
    ///
    /// # Returns
    /// `true` once the future completed, even if the output was not awaited yet
    pub fn is_finished(&self) -> bool {
        self.task.completed.load(Ordering::Acquire)
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut waiters = self.task.waiters.lock();

        if self.task.completed.load(Ordering::Acquire) {
            drop(waiters);

            if let Some(result) = self.task.result.lock().take() {
                return Poll::Ready(result);
            }

            // already taken by an earlier poll; never resolves twice
            return Poll::Pending;
        }

        waiters.push(cx.waker().clone());

        Poll::Pending
    }
}

/// Collects several [`JoinHandle`]s to await them together.
pub struct JoinSet<T> {
    handles: Vec<JoinHandle<T>>,
}

impl<T> JoinSet<T> {
    /// Creates an empty set.
    ///
    /// # Example
    /// ```ignore
    /// let mut set = JoinSet::new();
    /// set.push(Task::spawn(async { 1 }));
    /// set.push(Task::spawn(async { 2 }));
    /// assert_eq!(set.await_all().await, vec![1, 2]);
    /// ```
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Adds a handle to the set.
    ///
    /// # Arguments
    /// * `handle` - The [`JoinHandle`] to add
    pub fn push(&mut self, handle: JoinHandle<T>) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Interrupts every task still in the set.
    pub fn interrupt_all(&self, reason: Interrupt) {
        for handle in &self.handles {
            if !handle.is_finished() {
                handle.interrupt(reason.clone());
            }
        }
    }

    /// Awaits every handle in insertion order, collecting the outputs.
    pub async fn await_all(&mut self) -> Vec<T> {
        let mut results = Vec::with_capacity(self.handles.len());
        for handle in self.handles.drain(..) {
            results.push(handle.await);
        }

        results
    }
}

impl<T> Default for JoinSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
