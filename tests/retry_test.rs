//! Retry policy timing and attempt counting on a paused clock

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use marketscrape::crawl_engine::{HarvestError, RetryPolicy};
use marketscrape::store::StoreError;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_transient_failures_then_success() {
    let policy = RetryPolicy::new(5, Duration::from_millis(100));
    let calls = Arc::new(AtomicU32::new(0));
    let start = Instant::now();

    let result: Result<&str, StoreError> = policy
        .run("Upsert", || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 3 {
                    Err(StoreError::Busy("database is locked".into()))
                } else {
                    Ok("stored")
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "stored");
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    // 100 + 200 + 400
    assert_eq!(start.elapsed(), Duration::from_millis(700));
}

#[tokio::test(start_paused = true)]
async fn test_attempts_run_out_with_last_error() {
    let policy = RetryPolicy::new(3, Duration::from_millis(50));
    let calls = Arc::new(AtomicU32::new(0));
    let start = Instant::now();

    let result: Result<(), StoreError> = policy
        .run("Existence check", || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Timeout(format!("attempt {n}")))
            }
        })
        .await;

    match result {
        Err(StoreError::Timeout(message)) => assert_eq!(message, "attempt 2"),
        other => panic!("expected the last timeout, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // No sleep after the final attempt
    assert_eq!(start.elapsed(), Duration::from_millis(150));
}

#[tokio::test(start_paused = true)]
async fn test_fatal_error_is_not_retried() {
    let policy = RetryPolicy::new(5, Duration::from_millis(100));
    let calls = Arc::new(AtomicU32::new(0));
    let start = Instant::now();

    let result: Result<(), HarvestError> = policy
        .run("Upsert", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(HarvestError::Store(StoreError::Constraint(
                    "CHECK constraint failed: downloads >= 0".into(),
                )))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_policy_never_sleeps() {
    let policy = RetryPolicy::new(0, Duration::from_secs(10));
    assert_eq!(policy.max_attempts(), 1);

    let calls = Arc::new(AtomicU32::new(0));
    let result: Result<(), StoreError> = policy
        .run("Lookup", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Busy("locked".into()))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_delay_schedule_doubles() {
    let policy = RetryPolicy::new(5, Duration::from_millis(500));
    let delays: Vec<u128> = (0..4).map(|i| policy.delay_for(i).as_millis()).collect();
    assert_eq!(delays, vec![500, 1_000, 2_000, 4_000]);
}
