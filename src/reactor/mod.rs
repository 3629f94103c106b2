//! The loop's wake-source reactor.
//!
//! - [`core`]: watcher registry, cross-thread sends and dispatch
//! - [`event`]: ticket-based waits for blocking primitives
//! - `notifier`: self-pipe the loop parks on

pub(crate) mod core;
pub(crate) mod event;
mod notifier;
