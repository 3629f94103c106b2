use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Cooperative scheduler hint: yields once to let other fibers run.
///
/// The current task goes to the back of the run queue, behind every fiber
/// that is already runnable. Unlike the blocking primitives this is not a
/// switchpoint: a pending interrupt stays queued for the next one.
pub async fn yield_now() {
    struct YieldOnce(bool);

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            if self.0 {
                return Poll::Ready(());
            }

            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }

    YieldOnce(false).await
}
