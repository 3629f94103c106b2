//! Runtime subsystem modules.

pub(crate) mod context;
mod core;
pub(crate) mod executor;
pub(crate) mod fiber;
pub(crate) mod queue;
pub(crate) mod waker;
pub mod yield_now;

pub use core::Runtime;
pub use fiber::{Fiber, FiberId, Wakeup};
pub use yield_now::yield_now;
