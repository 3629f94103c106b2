//! Fluent builder for Runtime construction.
//!
//! Every knob has a default, so `RuntimeBuilder::new().build()` is the same as
//! `Runtime::new()`.

use crate::error::Result;
use crate::runtime::Runtime;

use std::time::Duration;

const DEFAULT_RUN_QUEUE_CAPACITY: usize = 64;
const DEFAULT_EVENT_INTERVAL: usize = 61;

/// Builder for constructing Runtime instances with fluent API.
///
/// # Example
/// ```ignore
/// let rt = RuntimeBuilder::new()
///     .event_interval(16)
///     .idle_timeout(Some(Duration::from_millis(50)))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct RuntimeBuilder {
    run_queue_capacity: usize,
    event_interval: usize,
    idle_timeout: Option<Duration>,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    /// Creates a builder with the default configuration.
    ///
    /// # Example
    /// ```ignore
    /// let builder = RuntimeBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            run_queue_capacity: DEFAULT_RUN_QUEUE_CAPACITY,
            event_interval: DEFAULT_EVENT_INTERVAL,
            idle_timeout: None,
        }
    }

    /// Initial capacity of the run queue. It still grows on demand.
    ///
    /// # Arguments
    /// * `capacity` - Number of runnable tasks preallocated (default 64)
    pub fn run_queue_capacity(mut self, capacity: usize) -> Self {
        self.run_queue_capacity = capacity;
        self
    }

    /// How many tasks the executor polls before the reactor gets to dispatch
    /// pending wakes. `0` drains the run queue every turn.
    ///
    /// # Arguments
    /// * `interval` - Tasks per turn (default 61)
    pub fn event_interval(mut self, interval: usize) -> Self {
        self.event_interval = interval;
        self
    }

    /// Upper bound on a single park of the loop. `None` parks until a wake
    /// arrives or the nearest timer is due.
    ///
    /// # Arguments
    /// * `timeout` - Maximum park time (default `None`)
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Builds the runtime.
    ///
    /// # Errors
    /// Fails if the reactor's notifier pipe cannot be created.
    ///
    /// # Returns
    /// A [`Runtime`] configured with this builder's settings
    pub fn build(self) -> Result<Runtime> {
        Runtime::with_config(
            self.run_queue_capacity,
            self.event_interval,
            self.idle_timeout,
        )
    }
}
