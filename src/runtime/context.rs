//! Thread-local runtime context.
//!
//! Blocking primitives need three things without taking them as arguments:
//! the run queue (to spawn), the reactor (to register watchers) and the fiber
//! being polled (to park it). [`enter_context`] installs the first two for the
//! duration of `block_on`; [`with_fiber`] installs the third around every poll
//! of a task or of the main future.
//!
//! # Example
//!
//! ```ignore
//! enter_context(queue, reactor.handle(), || {
//!     with_fiber(&fiber, || task.poll());
//! });
//! ```

use crate::reactor::core::ReactorHandle;
use crate::runtime::fiber::Fiber;
use crate::runtime::queue::TaskQueue;

use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    /// Run queue of the runtime currently inside `block_on` on this thread.
    static CURRENT_QUEUE: RefCell<Option<Arc<TaskQueue>>> = const { RefCell::new(None) };

    /// Reactor of the runtime currently inside `block_on` on this thread.
    static CURRENT_REACTOR: RefCell<Option<ReactorHandle>> = const { RefCell::new(None) };

    /// Fiber being polled right now.
    static CURRENT_FIBER: RefCell<Option<Fiber>> = const { RefCell::new(None) };
}

/// Runs `function` with `queue` and `reactor` installed as the current
/// runtime context. The previous context is restored on exit, so nested
/// runtimes on one thread behave.
pub(crate) fn enter_context<F, R>(queue: Arc<TaskQueue>, reactor: ReactorHandle, function: F) -> R
where
    F: FnOnce() -> R,
{
    let previous_queue = CURRENT_QUEUE.with(|current| current.borrow_mut().replace(queue));
    let previous_reactor = CURRENT_REACTOR.with(|current| current.borrow_mut().replace(reactor));

    let _restore = Restore(Some(move || {
        CURRENT_QUEUE.with(|current| *current.borrow_mut() = previous_queue);
        CURRENT_REACTOR.with(|current| *current.borrow_mut() = previous_reactor);
    }));

    function()
}

/// Runs `function` with `fiber` as the current fiber.
pub(crate) fn with_fiber<F, R>(fiber: &Fiber, function: F) -> R
where
    F: FnOnce() -> R,
{
    let previous = CURRENT_FIBER.with(|current| current.borrow_mut().replace(fiber.clone()));

    let _restore = Restore(Some(move || {
        CURRENT_FIBER.with(|current| *current.borrow_mut() = previous);
    }));

    function()
}

pub(crate) fn current_fiber() -> Option<Fiber> {
    CURRENT_FIBER.with(|current| current.borrow().clone())
}

pub(crate) fn current_queue() -> Option<Arc<TaskQueue>> {
    CURRENT_QUEUE.with(|current| current.borrow().clone())
}

/// Returns the reactor of the current runtime.
///
/// # Panics
/// Panics if not called within `Runtime::block_on`.
pub(crate) fn current_reactor() -> ReactorHandle {
    CURRENT_REACTOR.with(|current| {
        current.borrow().clone().expect(
            "No reactor in current context. Blocking primitives must be awaited within Runtime::block_on",
        )
    })
}

// Restores the previous context even if the closure panics.
struct Restore<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Drop for Restore<F> {
    fn drop(&mut self) {
        if let Some(restore) = self.0.take() {
            restore();
        }
    }
}
