//! `Async`: a reusable wakeup for exactly one waiting fiber.
//!
//! A fiber calls [`Async::wait`] and parks. Anyone holding a clone (another
//! fiber, a timer callback, a different OS thread) calls [`Async::signal`]; the
//! reactor then runs the wake callback on the loop thread, which hands the
//! value to the waiting fiber and deactivates the watcher.
//!
//! Signals are not buffered. A signal sent while nobody waits is dropped, and
//! several signals sent before the reactor dispatches collapse into the last
//! one.
//!
//! # Example
//!
//! ```ignore
//! use coop_reactor::{Async, Runtime};
//! use std::thread;
//!
//! let mut rt = Runtime::new()?;
//! let ready = Async::<u32>::new();
//!
//! let value = rt.block_on(async {
//!     let remote = ready.clone();
//!     let waiter = ready.wait();
//!     thread::spawn(move || {
//!         while !remote.is_active() {
//!             thread::yield_now();
//!         }
//!         remote.signal(42);
//!     });
//!     waiter.await
//! })?;
//!
//! assert_eq!(value, Ok(Some(42)));
//! ```

use crate::error::Interrupt;
use crate::reactor::core::{ReactorHandle, Watch, WatchKey};
use crate::runtime::context;
use crate::runtime::fiber::{Fiber, switchpoint};

use parking_lot::Mutex;

use std::fmt;
use std::sync::{Arc, Weak};

/// What a waiting fiber is resumed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resume<T> {
    /// Plain payload; `None` when the signal carried no value.
    Value(Option<T>),
    /// Error-shaped payload: sent with [`Async::raise`] or delivered to the
    /// fiber as an interrupt.
    Raise(Interrupt),
}

impl<T> Resume<T> {
    pub fn into_result(self) -> Result<Option<T>, Interrupt> {
        match self {
            Resume::Value(value) => Ok(value),
            Resume::Raise(reason) => Err(reason),
        }
    }

    pub fn is_raise(&self) -> bool {
        matches!(self, Resume::Raise(_))
    }
}

struct State<T> {
    active: bool,
    owner: Option<Fiber>,
    reactor: Option<(ReactorHandle, WatchKey)>,
    pending: Option<Resume<T>>,
    delivered: Option<Resume<T>>,
}

impl<T> State<T> {
    fn deactivate(&mut self) {
        if !self.active {
            return;
        }

        if let Some((reactor, key)) = self.reactor.take() {
            reactor.unregister(key);
        }
        self.active = false;
        self.owner = None;
        self.pending = None;
    }
}

struct Inner<T> {
    state: Mutex<State<T>>,
}

impl<T: Send> Watch for Inner<T> {
    fn on_wake(&self) {
        let owner = {
            let mut state = self.state.lock();
            if !state.active {
                return;
            }

            state.delivered = Some(state.pending.take().unwrap_or(Resume::Value(None)));
            let owner = state.owner.take();
            state.deactivate();
            owner
        };

        if let Some(owner) = owner {
            owner.schedule(Ok(()));
        }
    }
}

/// Cross-context wakeup for one waiting fiber. Cloning shares the watcher.
pub struct Async<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> Async<T> {
    /// Creates an inactive watcher. It registers with the reactor only while
    /// a fiber waits on it.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    active: false,
                    owner: None,
                    reactor: None,
                    pending: None,
                    delivered: None,
                }),
            }),
        }
    }

    /// Parks the current fiber until the watcher is signalled.
    ///
    /// Returns the signalled value, or `Err` when the fiber is interrupted or
    /// the value was sent with [`raise`](Self::raise). The watcher is
    /// deactivated on every exit path, including the future being dropped.
    ///
    /// Only one fiber may wait at a time; a second concurrent `wait` returns
    /// `Err(Interrupt::Raised(..))` right away.
    ///
    /// # Returns
    /// `Ok(Some(value))` for `signal(value)`, `Ok(None)` for `signal(None)`
    ///
    /// # Panics
    /// Panics when awaited outside of `Runtime::block_on`.
    ///
    /// # Example
    /// ```ignore
    /// let waiter = {
    ///     let ready = ready.clone();
    ///     Task::spawn(async move { ready.wait().await })
    /// };
    /// yield_now().await;
    /// ready.signal(3);
    /// assert_eq!(waiter.await, Ok(Some(3)));
    /// ```
    pub async fn wait(&self) -> Result<Option<T>, Interrupt> {
        self.wait_no_raise().await.into_result()
    }

    /// Like [`wait`](Self::wait), but error-shaped payloads come back as
    /// [`Resume::Raise`] instead of `Err`.
    ///
    /// Use it to inspect a cancellation instead of propagating it.
    pub async fn wait_no_raise(&self) -> Resume<T> {
        self.wait_with(|_| {}).await
    }

    /// Activates, runs `on_start` with the watcher armed, then parks.
    pub(crate) async fn wait_with<F>(&self, on_start: F) -> Resume<T>
    where
        F: FnOnce(&Self),
    {
        if !self.activate() {
            return Resume::Raise(Interrupt::Raised(
                "Async is already awaited by another fiber".to_string(),
            ));
        }
        let _active = DeactivateOnExit(&*self.inner);

        on_start(self);

        let resumed = match switchpoint().await {
            Ok(()) => self.inner.state.lock().delivered.take(),
            Err(reason) => Some(Resume::Raise(reason)),
        };

        resumed.unwrap_or(Resume::Value(None))
    }

    /// Delivers `value` to the waiting fiber. Dropped if nobody waits.
    ///
    /// Callable from any thread. Several signals before the reactor
    /// dispatches collapse into the last one.
    ///
    /// # Arguments
    /// * `value` - The payload; a bare `T` or `None` for a value-less wakeup
    ///
    /// # Example
    /// ```ignore
    /// ready.signal(42);
    /// ready.signal(None);
    /// ```
    pub fn signal(&self, value: impl Into<Option<T>>) {
        self.send(Resume::Value(value.into()));
    }

    /// Resumes the waiting fiber with an error-shaped payload.
    ///
    /// # Arguments
    /// * `reason` - Returned as `Err` by `wait`, as [`Resume::Raise`] by
    ///   `wait_no_raise`
    pub fn raise(&self, reason: Interrupt) {
        self.send(Resume::Raise(reason));
    }

    /// Whether a fiber is currently parked in `wait`.
    pub fn is_active(&self) -> bool {
        self.inner.state.lock().active
    }

    fn send(&self, payload: Resume<T>) {
        let target = {
            let mut state = self.inner.state.lock();
            if !state.active {
                return;
            }

            state.pending = Some(payload);
            state.reactor.clone()
        };

        if let Some((reactor, key)) = target {
            reactor.send(key);
        }
    }

    fn activate(&self) -> bool {
        let mut state = self.inner.state.lock();
        if state.active {
            return false;
        }

        let reactor = context::current_reactor();
        let watcher: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        let key = reactor.register(watcher);

        state.active = true;
        state.owner = Some(Fiber::current());
        state.reactor = Some((reactor, key));
        state.pending = None;
        state.delivered = None;

        true
    }
}

struct DeactivateOnExit<'a, T>(&'a Inner<T>);

impl<T> Drop for DeactivateOnExit<'_, T> {
    fn drop(&mut self) {
        self.0.state.lock().deactivate();
    }
}

impl<T> Clone for Async<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> Default for Async<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Async<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Async")
            .field("active", &state.active)
            .field("owner", &state.owner.as_ref().map(Fiber::id))
            .finish_non_exhaustive()
    }
}
