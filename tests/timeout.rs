use coop_reactor::time::{TimeError, cancel_after, move_on_after, timeout};
use coop_reactor::{Interrupt, RuntimeBuilder, Task, sleep};
use std::time::{Duration, Instant};

#[test]
fn test_timeout_completes_before_deadline() {
    let mut rt = RuntimeBuilder::new().build().unwrap();

    let result = rt
        .block_on(async {
            let handle = Task::spawn(async {
                sleep(Duration::from_millis(10)).await.unwrap();
                123
            });
            timeout(Duration::from_millis(500), handle).await
        })
        .unwrap();

    assert_eq!(result, Ok(123), "Timeout should return Ok(123)");
}

#[test]
fn test_timeout_expires() {
    let mut rt = RuntimeBuilder::new().build().unwrap();
    let start = Instant::now();

    let result = rt
        .block_on(async {
            let handle = Task::spawn(async {
                sleep(Duration::from_millis(300)).await.unwrap();
                456
            });
            timeout(Duration::from_millis(20), handle).await
        })
        .unwrap();

    assert_eq!(result, Err(TimeError::TimeOut));
    assert!(start.elapsed() < Duration::from_millis(300));
}

#[test]
fn test_move_on_after_returns_none_on_expiry() {
    let mut rt = RuntimeBuilder::new().build().unwrap();

    let (slow, fast) = rt
        .block_on(async {
            let slow = move_on_after(Duration::from_millis(10), sleep(Duration::from_secs(10))).await;
            let fast = move_on_after(Duration::from_secs(10), async { "quick" }).await;
            (slow, fast)
        })
        .unwrap();

    assert_eq!(slow, None);
    assert_eq!(fast, Some("quick"));
}

#[test]
fn test_cancel_after_reports_cancel() {
    let mut rt = RuntimeBuilder::new().build().unwrap();

    let result = rt
        .block_on(cancel_after(
            Duration::from_millis(10),
            sleep(Duration::from_secs(10)),
        ))
        .unwrap();

    assert_eq!(result, Err(Interrupt::Cancel));
}

#[test]
fn test_zero_timeout_fails_without_polling() {
    let mut rt = RuntimeBuilder::new().build().unwrap();

    let result = rt
        .block_on(timeout(Duration::ZERO, async { 1 }))
        .unwrap();

    assert_eq!(result, Err(TimeError::TimeOut));
}

#[test]
fn test_expired_sleep_timer_is_cancelled() {
    let mut rt = RuntimeBuilder::new()
        .idle_timeout(Some(Duration::from_millis(50)))
        .build()
        .unwrap();

    rt.block_on(async {
        // the inner sleep is dropped with its timer; the next sleep must not
        // be resumed early by it
        let _ = move_on_after(Duration::from_millis(5), sleep(Duration::from_millis(20))).await;

        let start = Instant::now();
        sleep(Duration::from_millis(40)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(40));
    })
    .unwrap();
}
