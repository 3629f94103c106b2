use coop_reactor::{JoinSet, Runtime, Task, sleep};
use std::time::{Duration, Instant};

#[test]
fn test_sleep_basic() {
    let mut rt = Runtime::new().unwrap();

    let start = Instant::now();
    rt.block_on(async {
        sleep(Duration::from_millis(50)).await.unwrap();
    })
    .unwrap();

    assert!(
        start.elapsed() >= Duration::from_millis(50),
        "Sleep should wait at least the specified duration"
    );
}

#[test]
fn test_sleep_zero_duration() {
    let mut rt = Runtime::new().unwrap();

    let start = Instant::now();
    let result = rt.block_on(sleep(Duration::ZERO)).unwrap();

    assert_eq!(result, Ok(()));
    assert!(
        start.elapsed() < Duration::from_millis(10),
        "Zero duration sleep should be fast"
    );
}

#[test]
fn test_sleeping_tasks_wake_in_deadline_order() {
    let mut rt = Runtime::new().unwrap();

    let order = rt
        .block_on(async {
            let finished = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
            let mut set = JoinSet::new();

            for ms in [30u64, 10, 20] {
                let finished = finished.clone();
                set.push(Task::spawn(async move {
                    sleep(Duration::from_millis(ms)).await.unwrap();
                    finished.borrow_mut().push(ms);
                }));
            }
            set.await_all().await;

            finished.borrow().clone()
        })
        .unwrap();

    assert_eq!(order, vec![10, 20, 30]);
}

#[test]
fn test_concurrent_sleeps_overlap() {
    let mut rt = Runtime::new().unwrap();
    let start = Instant::now();

    rt.block_on(async {
        let mut set = JoinSet::new();
        for _ in 0..5 {
            set.push(Task::spawn(sleep(Duration::from_millis(40))));
        }
        for result in set.await_all().await {
            assert_eq!(result, Ok(()));
        }
    })
    .unwrap();

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(40));
    assert!(elapsed < Duration::from_millis(190));
}
