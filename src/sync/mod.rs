//! Fiber-blocking primitives.
//!
//! - [`Async`]: one waiter, signalled from anywhere
//! - [`Queue`]: many waiters, woken one per pushed value

pub mod queue;
pub mod signal;

pub use queue::Queue;
pub use signal::{Async, Resume};
