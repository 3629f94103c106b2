//! Deadlines for arbitrary futures.
//!
//! - [`timeout`] fails with [`TimeError::TimeOut`] when the deadline passes
//! - [`move_on_after`] gives up quietly and returns `None`
//! - [`cancel_after`] reports expiry as an [`Interrupt::Cancel`](crate::Interrupt::Cancel)
//!
//! On expiry the inner future is dropped, which unwinds whatever it was
//! blocked on: an `Async` watcher is deactivated, a queue waiter is removed,
//! a pending sleep timer is cancelled.
//!
//! # Example
//!
//! ```ignore
//! use coop_reactor::time::{move_on_after, timeout, TimeError};
//! use coop_reactor::Queue;
//! use std::time::Duration;
//!
//! async fn poll_queue(queue: &Queue<u32>) {
//!     let first = move_on_after(Duration::from_millis(10), queue.shift()).await;
//!     assert!(first.is_none());
//!
//!     let second = timeout(Duration::from_millis(10), queue.shift()).await;
//!     assert!(matches!(second, Err(TimeError::TimeOut)));
//! }
//! ```

pub mod timeout;

pub use timeout::{Timeout, cancel_after, move_on_after, timeout};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("deadline elapsed")]
    TimeOut,
}
