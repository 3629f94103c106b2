//! Unbounded FIFO queue with a blocking `shift`.
//!
//! Consumers that find the queue empty park as waiters. Each `push` (or
//! `unshift`) wakes exactly one waiter, oldest first, and only then stores
//! its value, so the woken consumer finds the value in place when it runs.
//!
//! The queue is single-threaded; share it between fibers with `Rc`.
//!
//! # Example
//!
//! ```ignore
//! use coop_reactor::{Queue, Runtime, Task};
//! use std::rc::Rc;
//!
//! let mut rt = Runtime::new()?;
//! rt.block_on(async {
//!     let queue = Rc::new(Queue::new());
//!
//!     let consumer = {
//!         let queue = queue.clone();
//!         Task::spawn(async move { queue.shift().await })
//!     };
//!     coop_reactor::yield_now().await;
//!
//!     queue.push("job");
//!     assert_eq!(consumer.await, Ok("job"));
//! })?;
//! ```

use crate::error::Interrupt;
use crate::reactor::event::{EventTicket, event_wait};
use crate::utils::ring::RingBuffer;

use std::cell::{Cell, RefCell};
use std::fmt;

struct Waiter {
    id: u64,
    ticket: EventTicket,
}

struct State<T> {
    values: RingBuffer<T>,
    waiters: RingBuffer<Waiter>,
    next_waiter: u64,
}

impl<T> State<T> {
    fn wake_one(&mut self) {
        if let Some(waiter) = self.waiters.shift() {
            waiter.ticket.signal();
        }
    }
}

/// FIFO value queue whose consumers can block until a value arrives.
pub struct Queue<T> {
    state: RefCell<State<T>>,
}

impl<T> Queue<T> {
    /// Creates an empty queue. Nothing is allocated until the first push.
    ///
    /// # Example
    /// ```ignore
    /// let queue: Queue<u32> = Queue::new();
    /// assert!(queue.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a queue with room for `capacity` values before growing.
    ///
    /// # Arguments
    /// * `capacity` - Number of values the buffer holds before it reallocates
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RefCell::new(State {
                values: RingBuffer::with_capacity(capacity),
                waiters: RingBuffer::new(),
                next_waiter: 1,
            }),
        }
    }

    /// Appends `value`, waking the oldest waiter first.
    ///
    /// The wake and the append happen in one step: no other fiber runs in
    /// between, so the woken consumer finds the value in place.
    ///
    /// # Arguments
    /// * `value` - The value to enqueue at the back
    ///
    /// # Example
    /// ```ignore
    /// queue.push("job");
    /// assert_eq!(queue.len(), 1);
    /// ```
    pub fn push(&self, value: T) {
        let mut state = self.state.borrow_mut();
        state.wake_one();
        state.values.push(value);
    }

    /// Prepends `value`, waking the oldest waiter first.
    ///
    /// # Arguments
    /// * `value` - The value to enqueue at the front, ahead of buffered ones
    pub fn unshift(&self, value: T) {
        let mut state = self.state.borrow_mut();
        state.wake_one();
        state.values.unshift(value);
    }

    /// Removes and returns the oldest value, parking the current fiber while
    /// the queue is empty.
    ///
    /// Returns `Err` if the fiber is interrupted while parked; its waiter is
    /// removed before returning. Dropping the future while parked removes the
    /// waiter as well.
    ///
    /// # Returns
    /// The oldest value, or the [`Interrupt`] the fiber was resumed with
    ///
    /// # Panics
    /// Panics when it has to park outside of `Runtime::block_on`.
    ///
    /// # Example
    /// ```ignore
    /// let consumer = {
    ///     let queue = queue.clone();
    ///     Task::spawn(async move { queue.shift().await })
    /// };
    /// queue.push(5);
    /// assert_eq!(consumer.await, Ok(5));
    /// ```
    pub async fn shift(&self) -> Result<T, Interrupt> {
        let mut at_front = false;

        loop {
            if let Some(value) = self.state.borrow_mut().values.shift() {
                return Ok(value);
            }

            let guard = WaiterGuard {
                queue: self,
                id: Cell::new(None),
            };

            let wakeup = event_wait(|ticket| {
                let id = self.add_waiter(ticket, at_front);
                guard.id.set(Some(id));
            })
            .await;

            match wakeup {
                Ok(()) => guard.release(),
                Err(reason) => return Err(reason),
            }

            // a fiber that ran between the wake and now took the value;
            // wait again without losing our place
            at_front = true;
        }
    }

    /// Removes and returns the oldest value without blocking.
    ///
    /// # Returns
    /// `None` when the queue is empty. Waiters are never touched.
    pub fn shift_no_wait(&self) -> Option<T> {
        self.state.borrow_mut().values.shift()
    }

    /// Removes every value, oldest first, passing each to `f`.
    ///
    /// The queue is drained before `f` runs, so `f` may push to it again.
    ///
    /// # Arguments
    /// * `f` - Called once per drained value
    pub fn shift_each<F>(&self, f: F)
    where
        F: FnMut(T),
    {
        let drained = self.shift_all();
        drained.into_iter().for_each(f);
    }

    /// Removes and returns every value, oldest first.
    pub fn shift_all(&self) -> Vec<T> {
        self.state.borrow_mut().values.shift_all()
    }

    /// Drops every buffered value. Waiters stay registered.
    pub fn clear(&self) {
        let drained = self.shift_all();
        drop(drained);
    }

    /// Number of buffered values. Waiters are not counted.
    pub fn len(&self) -> usize {
        self.state.borrow().values.len()
    }

    /// Whether no values are buffered, even while fibers wait in `shift`.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().values.is_empty()
    }

    /// Number of fibers parked in [`shift`](Self::shift).
    pub fn waiter_count(&self) -> usize {
        self.state.borrow().waiters.len()
    }

    fn add_waiter(&self, ticket: EventTicket, at_front: bool) -> u64 {
        let mut state = self.state.borrow_mut();
        let id = state.next_waiter;
        state.next_waiter += 1;

        let waiter = Waiter { id, ticket };
        if at_front {
            state.waiters.unshift(waiter);
        } else {
            state.waiters.push(waiter);
        }

        id
    }
}

impl<T: PartialEq> Queue<T> {
    /// Removes the first value equal to `value`. Waiters are unaffected.
    ///
    /// # Returns
    /// `true` if a matching value was found and removed
    pub fn delete(&self, value: &T) -> bool {
        self.state.borrow_mut().values.delete(value)
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Queue")
            .field("values", &state.values)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}

// Removes a consumer's waiter when its wait ends abnormally.
struct WaiterGuard<'a, T> {
    queue: &'a Queue<T>,
    id: Cell<Option<u64>>,
}

impl<T> WaiterGuard<'_, T> {
    // Normal wakeup: the producer already removed us.
    fn release(self) {
        if let Some(id) = self.id.take() {
            self.queue
                .state
                .borrow_mut()
                .waiters
                .delete_by(|waiter| waiter.id == id);
        }
    }
}

impl<T> Drop for WaiterGuard<'_, T> {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };

        let mut state = self.queue.state.borrow_mut();
        let removed = state.waiters.delete_by(|waiter| waiter.id == id).is_some();

        // woken but leaving without the value: pass the wakeup on
        if !removed && !state.values.is_empty() {
            state.wake_one();
        }
    }
}
