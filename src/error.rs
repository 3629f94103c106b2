//! Error types shared across the runtime.
//!
//! [`Interrupt`] is the error-shaped payload a suspended fiber can be resumed
//! with instead of a normal wakeup. [`Error`] covers the failures of the
//! runtime itself; interrupts never surface through it, they are returned by
//! the blocking call that was interrupted.

use thiserror::Error;

/// Reason a suspended fiber was resumed abnormally.
///
/// Delivered through [`Fiber::interrupt`](crate::Fiber::interrupt) or
/// [`Async::raise`](crate::Async::raise). Every blocking primitive unwinds its
/// own registration before handing this back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Interrupt {
    #[error("fiber was cancelled")]
    Cancel,

    #[error("fiber was told to move on")]
    MoveOn,

    #[error("fiber was stopped")]
    Stop,

    #[error("{0}")]
    Raised(String),
}

/// Errors raised by the runtime.
#[derive(Debug, Error)]
pub enum Error {
    #[error("reactor notifier failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
