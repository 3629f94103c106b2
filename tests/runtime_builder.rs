use coop_reactor::{Runtime, RuntimeBuilder, Task, yield_now};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[test]
fn test_builder_creation() {
    let rt = RuntimeBuilder::new().build().unwrap();
    drop(rt);
}

#[test]
fn test_builder_immediate_result() {
    let mut rt = RuntimeBuilder::default().build().unwrap();

    let result = rt.block_on(async { 42 }).unwrap();

    assert_eq!(result, 42, "Future should return correct value");
}

#[test]
fn test_builder_multiple_instances() {
    let mut rt1 = RuntimeBuilder::new().build().unwrap();
    let mut rt2 = Runtime::new().unwrap();

    let result1 = rt1.block_on(async { 10 }).unwrap();
    let result2 = rt2.block_on(async { 20 }).unwrap();

    assert_eq!(result1, 10);
    assert_eq!(result2, 20);
}

#[test]
fn test_runtime_is_reusable_across_block_on_calls() {
    let mut rt = Runtime::new().unwrap();

    for round in 0..3 {
        let result = rt
            .block_on(async move { Task::spawn(async move { round + 1 }).await })
            .unwrap();
        assert_eq!(result, round + 1);
    }
}

#[test]
fn test_small_event_interval_still_runs_everything() {
    let mut rt = RuntimeBuilder::new()
        .run_queue_capacity(1)
        .event_interval(1)
        .build()
        .unwrap();
    let counter = Arc::new(Mutex::new(0));

    let c = counter.clone();
    rt.block_on(async move {
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let c = c.clone();
                Task::spawn(async move {
                    yield_now().await;
                    *c.lock().unwrap() += 1;
                })
            })
            .collect();

        for handle in handles {
            handle.await;
        }
    })
    .unwrap();

    assert_eq!(*counter.lock().unwrap(), 10);
}

#[test]
fn test_unbounded_event_interval() {
    let mut rt = RuntimeBuilder::new().event_interval(0).build().unwrap();

    let result = rt
        .block_on(async {
            let a = Task::spawn(async { 1 });
            let b = Task::spawn(async { 2 });
            a.await + b.await
        })
        .unwrap();

    assert_eq!(result, 3);
}

#[test]
fn test_spawn_before_block_on() {
    let mut rt = RuntimeBuilder::new().build().unwrap();
    let executed = Arc::new(Mutex::new(false));
    let executed_clone = executed.clone();

    rt.spawn(async move {
        *executed_clone.lock().unwrap() = true;
    });

    rt.block_on(async {}).unwrap();

    assert!(
        *executed.lock().unwrap(),
        "Spawned task should execute before block_on returns"
    );
}

#[test]
fn test_idle_timeout_does_not_cut_sleep_short() {
    let mut rt = RuntimeBuilder::new()
        .idle_timeout(Some(Duration::from_millis(5)))
        .build()
        .unwrap();

    let start = Instant::now();
    rt.block_on(async {
        coop_reactor::sleep(Duration::from_millis(30)).await.unwrap();
    })
    .unwrap();

    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn test_runtime_error_wraps_io_failures() {
    let err: coop_reactor::Error = std::io::Error::other("pipe exhausted").into();

    assert!(matches!(err, coop_reactor::Error::Io(_)));
    assert_eq!(err.to_string(), "reactor notifier failed: pipe exhausted");
}
