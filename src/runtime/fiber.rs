//! Fiber identity, resume slots and the switchpoint.
//!
//! Every task the runtime polls (and the future passed to `block_on`) runs as a
//! fiber. A fiber suspends by awaiting [`switchpoint`]; it is resumed when
//! something calls [`Fiber::schedule`] with a [`Wakeup`]. `Ok(())` is a normal
//! wakeup, `Err(Interrupt)` is the error-shaped resumption used for
//! cancellation.

use crate::error::Interrupt;
use crate::runtime::context;

use parking_lot::Mutex;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll, Waker};

/// Value a suspended fiber is resumed with.
pub type Wakeup = Result<(), Interrupt>;

static NEXT_FIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique fiber identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FiberId(u64);

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fiber-{}", self.0)
    }
}

#[derive(Default)]
struct Slot {
    scheduled: Option<Wakeup>,
    waker: Option<Waker>,
}

struct FiberState {
    id: FiberId,
    slot: Mutex<Slot>,
}

/// Handle to a cooperatively scheduled fiber.
///
/// Cloning the handle does not clone the fiber. Handles are `Send`, so a fiber
/// can be interrupted from another thread.
#[derive(Clone)]
pub struct Fiber {
    state: Arc<FiberState>,
}

impl Fiber {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(FiberState {
                id: FiberId(NEXT_FIBER_ID.fetch_add(1, Ordering::Relaxed)),
                slot: Mutex::new(Slot::default()),
            }),
        }
    }

    /// Returns the fiber currently being polled.
    ///
    /// # Panics
    /// Panics when called outside of `Runtime::block_on`.
    pub fn current() -> Fiber {
        Self::try_current().expect("Fiber::current() called outside of a runtime context")
    }

    /// Returns the fiber currently being polled, if any.
    pub fn try_current() -> Option<Fiber> {
        context::current_fiber()
    }

    pub fn id(&self) -> FiberId {
        self.state.id
    }

    /// Marks the fiber runnable, to be resumed with `wakeup`.
    ///
    /// If the fiber is parked at a switchpoint its task is woken. Otherwise the
    /// value waits for its next switchpoint, where an interrupt is delivered
    /// immediately and a normal wakeup is discarded as stale.
    ///
    /// An undelivered interrupt is never replaced by `Ok(())`: a fiber that
    /// was cancelled and then woken normally before it ran still sees the
    /// cancellation. A later interrupt replaces an earlier one.
    ///
    /// # Arguments
    /// * `wakeup` - `Ok(())` for a normal resume, `Err(reason)` to interrupt
    pub fn schedule(&self, wakeup: Wakeup) {
        let waker = {
            let mut slot = self.state.slot.lock();
            let keep_interrupt = wakeup.is_ok() && matches!(slot.scheduled, Some(Err(_)));
            if !keep_interrupt {
                slot.scheduled = Some(wakeup);
            }
            slot.waker.take()
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Resumes the fiber with an error-shaped value.
    pub fn interrupt(&self, reason: Interrupt) {
        self.schedule(Err(reason));
    }

    /// Shorthand for `interrupt(Interrupt::Cancel)`.
    pub fn cancel(&self) {
        self.interrupt(Interrupt::Cancel);
    }

    /// Whether the fiber is currently parked at a switchpoint.
    pub fn is_suspended(&self) -> bool {
        self.state.slot.lock().waker.is_some()
    }

    fn unpark(&self) {
        self.state.slot.lock().waker = None;
    }
}

impl PartialEq for Fiber {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for Fiber {}

impl fmt::Debug for Fiber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fiber")
            .field("id", &self.state.id)
            .field("suspended", &self.is_suspended())
            .finish()
    }
}

/// Suspends the current fiber until it is scheduled.
///
/// # Panics
/// The returned future panics on first poll outside of a runtime context.
pub(crate) fn switchpoint() -> Switchpoint {
    Switchpoint { fiber: None }
}

pub(crate) struct Switchpoint {
    fiber: Option<Fiber>,
}

impl Future for Switchpoint {
    type Output = Wakeup;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let fiber = match &self.fiber {
            Some(fiber) => fiber.clone(),
            None => {
                let fiber = Fiber::current();
                {
                    let mut slot = fiber.state.slot.lock();
                    match slot.scheduled.take() {
                        Some(Err(reason)) => return Poll::Ready(Err(reason)),
                        Some(Ok(())) | None => {}
                    }
                    slot.waker = Some(cx.waker().clone());
                }
                self.fiber = Some(fiber);
                return Poll::Pending;
            }
        };

        let mut slot = fiber.state.slot.lock();
        match slot.scheduled.take() {
            Some(wakeup) => {
                slot.waker = None;
                drop(slot);
                self.fiber = None;
                Poll::Ready(wakeup)
            }
            None => {
                match &mut slot.waker {
                    Some(current) if current.will_wake(cx.waker()) => {}
                    stored => *stored = Some(cx.waker().clone()),
                }
                Poll::Pending
            }
        }
    }
}

impl Drop for Switchpoint {
    fn drop(&mut self) {
        if let Some(fiber) = self.fiber.take() {
            fiber.unpark();
        }
    }
}
