//! Cooperative single-threaded fiber runtime with blocking primitives.
//!
//! Spawned futures run as fibers on one event loop. Fibers block on two
//! primitives, and the loop parks in its reactor whenever nothing is runnable.
//!
//! # Architecture
//!
//! - **Runtime**: drives the main future, the run queue, reactor wakes and timers via `block_on`
//! - **Fiber**: identity and resume slot of every polled future; target of interrupts
//! - **Reactor**: watcher registry woken from any thread, dispatched on the loop thread
//! - **Async**: reusable cross-context wakeup for a single waiting fiber
//! - **Queue**: FIFO queue whose `shift` parks until a value is pushed, waking waiters in order
//! - **RingBuffer**: growable double-ended buffer backing the queue
//! - **RuntimeBuilder**: fluent configuration of the loop
//! - **time**: sleep and deadline combinators
//!
//! # Example
//!
//! ```ignore
//! use coop_reactor::{Queue, Runtime, Task};
//! use std::rc::Rc;
//!
//! let mut rt = Runtime::new()?;
//! let sum = rt.block_on(async {
//!     let queue = Rc::new(Queue::new());
//!     let producer = {
//!         let queue = queue.clone();
//!         Task::spawn(async move {
//!             for n in 1..=3 {
//!                 queue.push(n);
//!             }
//!         })
//!     };
//!
//!     let mut sum = 0;
//!     for _ in 0..3 {
//!         sum += queue.shift().await.unwrap_or(0);
//!     }
//!     producer.await;
//!     sum
//! })?;
//! assert_eq!(sum, 6);
//! ```

mod builder;
mod error;
mod reactor;
mod runtime;
mod sync;
mod task;
mod timer;
mod utils;

pub mod time;

pub use builder::RuntimeBuilder;
pub use error::{Error, Interrupt, Result};
pub use runtime::yield_now;
pub use runtime::{Fiber, FiberId, Runtime, Wakeup};
pub use sync::{Async, Queue, Resume};
pub use task::{JoinHandle, JoinSet, Task};
pub use timer::sleep;
pub use utils::ring::RingBuffer;
