//! Timeout combinators.

use crate::error::Interrupt;
use crate::time::TimeError;
use crate::timer::{self, Expiry, TimerId};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Wraps a future with a deadline. Resolves to `Err(TimeError::TimeOut)` if
/// `future` has not completed `duration` from now.
///
/// # Example
/// ```ignore
/// let result = timeout(Duration::from_millis(100), async {
///     sleep(Duration::from_millis(50)).await.ok();
///     "done"
/// }).await;
/// assert_eq!(result, Ok("done"));
/// ```
pub fn timeout<F>(duration: Duration, future: F) -> Timeout<F>
where
    F: Future,
{
    Timeout::new(duration, future)
}

/// Runs `future` for at most `duration`; `None` if the deadline passed first.
pub async fn move_on_after<F: Future>(duration: Duration, future: F) -> Option<F::Output> {
    timeout(duration, future).await.ok()
}

/// Runs `future` for at most `duration`; `Err(Interrupt::Cancel)` if the
/// deadline passed first.
pub async fn cancel_after<F: Future>(duration: Duration, future: F) -> Result<F::Output, Interrupt> {
    timeout(duration, future)
        .await
        .map_err(|TimeError::TimeOut| Interrupt::Cancel)
}

/// Future returned by [`timeout`].
pub struct Timeout<F> {
    /// The wrapped future.
    future: F,

    /// The deadline at which the timeout expires.
    deadline: Instant,

    /// Timer registered on the first pending poll.
    timer: Option<TimerId>,
}

impl<F> Timeout<F> {
    pub(crate) fn new(duration: Duration, future: F) -> Self {
        Timeout {
            future,
            deadline: Instant::now() + duration,
            timer: None,
        }
    }

    fn disarm(&mut self) {
        if let Some(id) = self.timer.take() {
            timer::cancel(id);
        }
    }
}

impl<F: Future> Future for Timeout<F> {
    type Output = Result<F::Output, TimeError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // `future` is never moved out of `self`
        let this = unsafe { self.get_unchecked_mut() };

        if Instant::now() >= this.deadline {
            this.disarm();
            return Poll::Ready(Err(TimeError::TimeOut));
        }

        let fut = unsafe { Pin::new_unchecked(&mut this.future) };
        if let Poll::Ready(v) = fut.poll(cx) {
            this.disarm();
            return Poll::Ready(Ok(v));
        }

        if this.timer.is_none() {
            let expiry = Expiry::Wake(cx.waker().clone());
            this.timer = Some(timer::register(this.deadline, expiry));
        }

        Poll::Pending
    }
}

impl<F> Drop for Timeout<F> {
    fn drop(&mut self) {
        self.disarm();
    }
}
