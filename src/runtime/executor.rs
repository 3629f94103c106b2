//! Drains the run queue, polling each task inside its own fiber context.

use crate::runtime::queue::TaskQueue;

use std::sync::Arc;

pub(crate) struct Executor {
    queue: Arc<TaskQueue>,
    event_interval: usize,
}

impl Executor {
    /// `event_interval` bounds how many tasks one call to [`Executor::run`]
    /// polls, so that reactor wakes get dispatched between batches. Zero
    /// means "until the queue is empty".
    pub(crate) fn new(queue: Arc<TaskQueue>, event_interval: usize) -> Self {
        Self {
            queue,
            event_interval,
        }
    }

    /// Polls ready tasks in FIFO order. Returns how many were polled.
    pub(crate) fn run(&self) -> usize {
        let mut polled = 0;

        while self.event_interval == 0 || polled < self.event_interval {
            let Some(task) = self.queue.pop() else {
                break;
            };

            task.run();
            polled += 1;
        }

        polled
    }
}
