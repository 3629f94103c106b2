use coop_reactor::time::move_on_after;
use coop_reactor::{Async, Fiber, Interrupt, Queue, Runtime, Task, sleep, yield_now};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_interrupt_ends_sleep_early() {
    let mut rt = Runtime::new().unwrap();
    let start = Instant::now();

    let result = rt
        .block_on(async {
            let sleeper = Task::spawn(async { sleep(Duration::from_secs(10)).await });
            yield_now().await;
            yield_now().await;

            assert!(sleeper.fiber().is_suspended());
            sleeper.interrupt(Interrupt::Stop);
            sleeper.await
        })
        .unwrap();

    assert_eq!(result, Err(Interrupt::Stop));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_interrupt_before_switchpoint_is_delivered_there() {
    let mut rt = Runtime::new().unwrap();

    rt.block_on(async {
        let queue: Queue<u8> = Queue::new();

        Fiber::current().cancel();
        assert_eq!(queue.shift().await, Err(Interrupt::Cancel));
        assert_eq!(queue.waiter_count(), 0);
    })
    .unwrap();
}

#[test]
fn test_normal_wakeup_does_not_replace_pending_interrupt() {
    let mut rt = Runtime::new().unwrap();

    rt.block_on(async {
        let queue: Queue<u8> = Queue::new();
        let fiber = Fiber::current();

        fiber.interrupt(Interrupt::Stop);
        fiber.schedule(Ok(()));
        assert_eq!(queue.shift().await, Err(Interrupt::Stop));

        // a newer interrupt does replace an older one
        fiber.cancel();
        fiber.interrupt(Interrupt::MoveOn);
        assert_eq!(queue.shift().await, Err(Interrupt::MoveOn));
        assert_eq!(queue.waiter_count(), 0);
    })
    .unwrap();
}

#[test]
fn test_stale_wakeup_is_discarded() {
    let mut rt = Runtime::new().unwrap();

    rt.block_on(async {
        let event = Async::<()>::new();

        Fiber::current().schedule(Ok(()));
        let waited = move_on_after(Duration::from_millis(20), event.wait()).await;
        assert_eq!(waited, None);
    })
    .unwrap();
}

#[test]
fn test_interrupt_from_another_thread() {
    let mut rt = Runtime::new().unwrap();

    let result = rt
        .block_on(async {
            let fiber = Fiber::current();
            let interrupter = thread::spawn(move || {
                while !fiber.is_suspended() {
                    thread::sleep(Duration::from_millis(1));
                }
                fiber.interrupt(Interrupt::MoveOn);
            });

            let queue: Queue<u8> = Queue::new();
            let result = queue.shift().await;
            interrupter.join().unwrap();
            result
        })
        .unwrap();

    assert_eq!(result, Err(Interrupt::MoveOn));
}

#[test]
fn test_fiber_ids_are_unique_and_displayable() {
    let mut rt = Runtime::new().unwrap();

    let (a, b) = rt
        .block_on(async {
            let a = Task::spawn(async { Fiber::current().id() });
            let b = Task::spawn(async { Fiber::current().id() });
            (a.await, b.await)
        })
        .unwrap();

    assert_ne!(a, b);
    assert!(a.to_string().starts_with("fiber-"));
}

#[test]
fn test_no_current_fiber_outside_runtime() {
    assert!(Fiber::try_current().is_none());
}

#[test]
#[should_panic(expected = "Fiber::current() called outside of a runtime context")]
fn test_current_fiber_panics_outside_runtime() {
    Fiber::current();
}
