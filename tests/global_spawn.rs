use coop_reactor::{Fiber, JoinSet, Runtime, Task, yield_now};
use std::sync::{Arc, Mutex};

#[test]
fn test_spawned_task_runs_before_block_on_returns() {
    let mut rt = Runtime::new().unwrap();
    let completed = Arc::new(Mutex::new(false));
    let completed_clone = completed.clone();

    rt.block_on(async move {
        Task::spawn(async move {
            *completed_clone.lock().unwrap() = true;
        });
    })
    .unwrap();

    assert!(
        *completed.lock().unwrap(),
        "Spawned task should have completed"
    );
}

#[test]
fn test_join_handle_returns_output() {
    let mut rt = Runtime::new().unwrap();

    let result = rt
        .block_on(async {
            let handle = Task::spawn(async { square(12) });
            handle.await
        })
        .unwrap();

    assert_eq!(result, 144);
}

fn square(x: i32) -> i32 {
    x * x
}

#[test]
fn test_spawn_from_spawned_task() {
    let mut rt = Runtime::new().unwrap();
    let values = Arc::new(Mutex::new(Vec::new()));

    let v = values.clone();
    rt.block_on(async move {
        let inner = Task::spawn(async move {
            v.lock().unwrap().push(1);

            let v2 = v.clone();
            Task::spawn(async move {
                v2.lock().unwrap().push(2);
            })
            .await;

            v.lock().unwrap().push(3);
        });
        inner.await;
    })
    .unwrap();

    assert_eq!(*values.lock().unwrap(), vec![1, 2, 3]);
}

#[test]
#[should_panic(expected = "Task::spawn() called outside of a runtime context")]
fn test_spawn_panics_outside_runtime() {
    Task::spawn(async {});
}

#[test]
fn test_join_set_collects_in_insertion_order() {
    let mut rt = Runtime::new().unwrap();

    let results = rt
        .block_on(async {
            let mut set = JoinSet::new();
            for i in 0..4 {
                set.push(Task::spawn(async move {
                    // later tasks finish first
                    for _ in 0..(4 - i) {
                        yield_now().await;
                    }
                    i * 10
                }));
            }

            assert_eq!(set.len(), 4);
            set.await_all().await
        })
        .unwrap();

    assert_eq!(results, vec![0, 10, 20, 30]);
}

#[test]
fn test_each_task_runs_in_its_own_fiber() {
    let mut rt = Runtime::new().unwrap();

    let (root, a, b) = rt
        .block_on(async {
            let root = Fiber::current().id();
            let a = Task::spawn(async { Fiber::current().id() });
            let b = Task::spawn(async { Fiber::current().id() });
            (root, a.await, b.await)
        })
        .unwrap();

    assert_ne!(root, a);
    assert_ne!(root, b);
    assert_ne!(a, b);
}

#[test]
fn test_join_handle_exposes_task_fiber() {
    let mut rt = Runtime::new().unwrap();

    rt.block_on(async {
        let handle = Task::spawn(async { Fiber::current() });
        let fiber = handle.fiber();
        assert_eq!(handle.await, fiber);
    })
    .unwrap();
}

#[test]
fn test_yield_now_interleaves_tasks() {
    let mut rt = Runtime::new().unwrap();
    let trace = Arc::new(Mutex::new(Vec::new()));

    let t = trace.clone();
    rt.block_on(async move {
        let mut set = JoinSet::new();
        for name in ["a", "b"] {
            let t = t.clone();
            set.push(Task::spawn(async move {
                for step in 0..2 {
                    t.lock().unwrap().push(format!("{name}{step}"));
                    yield_now().await;
                }
            }));
        }
        set.await_all().await;
    })
    .unwrap();

    assert_eq!(*trace.lock().unwrap(), vec!["a0", "b0", "a1", "b1"]);
}
