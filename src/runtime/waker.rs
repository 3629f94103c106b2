//! Waker implementation that re-queues a task when woken.

use crate::task::Runnable;

use std::sync::Arc;
use std::task::{RawWaker, RawWakerVTable, Waker};

/// Waker payload: the task to push back onto its run queue.
pub(crate) struct TaskWaker {
    task: Arc<dyn Runnable>,
}

impl TaskWaker {
    fn new(task: Arc<dyn Runnable>) -> Arc<Self> {
        Arc::new(Self { task })
    }

    fn wake(self: &Arc<Self>) {
        self.task.clone().schedule();
    }

    fn clone_raw(ptr: *const ()) -> RawWaker {
        unsafe {
            let arc = Arc::<TaskWaker>::from_raw(ptr as *const TaskWaker);
            let cloned = arc.clone();
            std::mem::forget(arc);
            RawWaker::new(Arc::into_raw(cloned) as *const (), &Self::VTABLE)
        }
    }

    fn wake_raw(ptr: *const ()) {
        unsafe {
            let arc = Arc::<TaskWaker>::from_raw(ptr as *const TaskWaker);
            arc.wake();
        }
    }

    fn wake_by_ref_raw(ptr: *const ()) {
        unsafe {
            let arc = Arc::<TaskWaker>::from_raw(ptr as *const TaskWaker);
            arc.wake();
            let _ = Arc::into_raw(arc);
        }
    }

    fn drop_raw(ptr: *const ()) {
        unsafe {
            drop(Arc::<TaskWaker>::from_raw(ptr as *const TaskWaker));
        }
    }

    const VTABLE: RawWakerVTable = RawWakerVTable::new(
        Self::clone_raw,
        Self::wake_raw,
        Self::wake_by_ref_raw,
        Self::drop_raw,
    );
}

/// Creates a Waker that re-queues `task` when called.
pub(crate) fn make_waker(task: Arc<dyn Runnable>) -> Waker {
    let w = TaskWaker::new(task);
    let raw = RawWaker::new(Arc::into_raw(w) as *const (), &TaskWaker::VTABLE);
    unsafe { Waker::from_raw(raw) }
}
