//! Timers and `sleep`.
//!
//! Timers live in a thread-local [`TimerDriver`]; the runtime loop fires the
//! expired ones every turn and parks no longer than the nearest deadline. A
//! timer either wakes a plain `Waker` (used by the timeout combinators) or
//! resumes a fiber parked at a switchpoint (used by [`sleep`]).

use crate::error::Interrupt;
use crate::runtime::fiber::{Fiber, switchpoint};

use std::cell::RefCell;
use std::task::Waker;
use std::time::{Duration, Instant};

thread_local! {
    static TIMER_DRIVER: RefCell<TimerDriver> = RefCell::new(TimerDriver::new());
}

/// What happens when a timer expires.
pub(crate) enum Expiry {
    Wake(Waker),
    Resume(Fiber),
}

impl Expiry {
    fn fire(self) {
        match self {
            Expiry::Wake(waker) => waker.wake(),
            Expiry::Resume(fiber) => fiber.schedule(Ok(())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TimerId(u64);

/// Registered timers of the current thread, in no particular order.
pub(crate) struct TimerDriver {
    timers: Vec<(Instant, TimerId, Expiry)>,
    next_id: u64,
}

impl TimerDriver {
    fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 1,
        }
    }

    fn register(&mut self, deadline: Instant, expiry: Expiry) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push((deadline, id, expiry));

        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|(_, timer, _)| *timer != id);
    }

    /// Removes the expired timers, earliest deadline first.
    fn take_expired(&mut self, now: Instant) -> Vec<Expiry> {
        let mut expired = Vec::new();
        let mut index = 0;
        while index < self.timers.len() {
            if self.timers[index].0 <= now {
                expired.push(self.timers.swap_remove(index));
            } else {
                index += 1;
            }
        }

        expired.sort_by_key(|(deadline, id, _)| (*deadline, id.0));
        expired.into_iter().map(|(_, _, expiry)| expiry).collect()
    }

    fn next_remaining(&self, now: Instant) -> Option<Duration> {
        self.timers
            .iter()
            .map(|(deadline, _, _)| deadline.saturating_duration_since(now))
            .min()
    }
}

/// Registers a timer on this thread's driver.
pub(crate) fn register(deadline: Instant, expiry: Expiry) -> TimerId {
    TIMER_DRIVER.with(|driver| driver.borrow_mut().register(deadline, expiry))
}

/// Removes a timer that has not fired yet. Unknown ids are ignored.
pub(crate) fn cancel(id: TimerId) {
    TIMER_DRIVER.with(|driver| driver.borrow_mut().cancel(id));
}

/// Fires every expired timer. Returns `true` while timers remain pending.
pub(crate) fn process_timers() -> bool {
    let now = Instant::now();
    let expired = TIMER_DRIVER.with(|driver| driver.borrow_mut().take_expired(now));

    // fired outside the borrow: a wake may register a new timer
    for expiry in expired {
        expiry.fire();
    }

    TIMER_DRIVER.with(|driver| !driver.borrow().timers.is_empty())
}

/// Time until the nearest deadline, if any timer is registered.
pub(crate) fn next_timer_remaining() -> Option<Duration> {
    TIMER_DRIVER.with(|driver| driver.borrow().next_remaining(Instant::now()))
}

// Cancels the timer when the owning future is dropped.
struct TimerGuard(TimerId);

impl Drop for TimerGuard {
    fn drop(&mut self) {
        cancel(self.0);
    }
}

/// Suspends the current fiber for `duration`.
///
/// Sleeping is a switchpoint: an interrupt delivered to the fiber ends the
/// sleep early and is returned as `Err`. A zero duration returns immediately.
///
/// # Panics
/// Panics when awaited outside of a runtime context.
///
/// # Example
/// ```ignore
/// use coop_reactor::sleep;
/// use std::time::Duration;
///
/// async {
///     sleep(Duration::from_millis(100)).await?;
///     println!("Woke up after 100ms");
/// };
/// ```
pub async fn sleep(duration: Duration) -> Result<(), Interrupt> {
    if duration.is_zero() {
        return Ok(());
    }

    let deadline = Instant::now() + duration;
    let _timer = TimerGuard(register(deadline, Expiry::Resume(Fiber::current())));

    loop {
        switchpoint().await?;

        // an explicit Fiber::schedule(Ok) can resume us before the deadline
        if Instant::now() >= deadline {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Wake;

    struct CountWake(AtomicUsize);

    impl Wake for CountWake {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn only_expired_uncancelled_timers_fire() {
        let mut driver = TimerDriver::new();
        let now = Instant::now();
        let count = Arc::new(CountWake(AtomicUsize::new(0)));

        driver.register(now + Duration::from_secs(60), Expiry::Wake(Waker::from(count.clone())));
        driver.register(now, Expiry::Wake(Waker::from(count.clone())));
        let cancelled = driver.register(now, Expiry::Wake(Waker::from(count.clone())));
        driver.cancel(cancelled);

        for expiry in driver.take_expired(now) {
            expiry.fire();
        }

        assert_eq!(count.0.load(Ordering::SeqCst), 1);
        assert_eq!(driver.timers.len(), 1);
        assert!(driver.next_remaining(now).unwrap() > Duration::from_secs(59));
    }
}
