// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::RetryConfig;
use crate::lock::LockState;
use crate::retry::FixedInterval;
use crate::store::{Fault, FakeStore, StoreCall, StoreError, StoreOp};
use crate::token::SequentialTokens;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

const LEASE: Duration = Duration::from_secs(10);
const ATTEMPT: Duration = Duration::from_millis(500);

fn client() -> Client<FakeStore, SequentialTokens> {
    Client::with_tokens(FakeStore::new(), SequentialTokens::new("token"))
}

fn never() -> CancellationToken {
    CancellationToken::new()
}

fn no_retry() -> FixedInterval {
    FixedInterval::new(Duration::from_millis(10), 0)
}

// =============================================================================
// try_lock
// =============================================================================

#[tokio::test]
async fn try_lock_returns_handle() {
    let client = client();
    let lock = client.try_lock("k", LEASE).await.unwrap();

    assert_eq!(lock.key(), "k");
    assert_eq!(lock.token(), "token-1");
    assert_eq!(lock.lease(), LEASE);
    assert_eq!(lock.state(), LockState::Held);
    assert_eq!(client.store().memory().holder("k").as_deref(), Some("token-1"));
    assert_eq!(
        client.store().calls(),
        vec![StoreCall::SetIfAbsent {
            key: "k".to_string(),
            token: "token-1".to_string(),
            lease: LEASE,
        }]
    );
}

#[tokio::test]
async fn try_lock_on_held_key_fails_to_preempt() {
    let client = client();
    let _holder = client.try_lock("k", LEASE).await.unwrap();

    let err = client.try_lock("k", LEASE).await.unwrap_err();
    assert!(matches!(err, LockError::FailedToPreempt));
    assert_eq!(client.store().memory().holder("k").as_deref(), Some("token-1"));
}

#[tokio::test]
async fn try_lock_passes_store_errors_through() {
    let client = client();
    client.store().push_fault(
        StoreOp::SetIfAbsent,
        Fault::Error(StoreError::Connection("refused".to_string())),
    );

    let err = client.try_lock("k", LEASE).await.unwrap_err();
    assert!(matches!(err, LockError::Store(StoreError::Connection(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_try_locks_admit_exactly_one() {
    let client = Client::new(FakeStore::new());

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.try_lock("fresh", LEASE).await })
        })
        .collect();

    let mut acquired = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => acquired += 1,
            Err(e) => assert!(matches!(e, LockError::FailedToPreempt)),
        }
    }
    assert_eq!(acquired, 1);
}

// =============================================================================
// lock
// =============================================================================

#[tokio::test(start_paused = true)]
async fn lock_acquires_free_key_with_acquire_script() {
    let client = client();
    let lock = client
        .lock("k", LEASE, ATTEMPT, no_retry(), &never())
        .await
        .unwrap();

    assert_eq!(lock.token(), "token-1");
    assert_eq!(client.store().count(StoreOp::Acquire), 1);
    assert_eq!(client.store().count(StoreOp::SetIfAbsent), 0);
}

#[tokio::test(start_paused = true)]
async fn lock_waits_for_release() {
    let client = client();
    let holder = client.try_lock("k", LEASE).await.unwrap();

    let waiter = {
        let client = client.clone();
        tokio::spawn(async move {
            let retry = FixedInterval::new(Duration::from_millis(100), 10);
            client.lock("k", LEASE, ATTEMPT, retry, &never()).await
        })
    };

    tokio::time::sleep(Duration::from_millis(250)).await;
    holder.unlock().await.unwrap();

    let lock = waiter.await.unwrap().unwrap();
    assert_eq!(lock.token(), "token-2");
    assert_eq!(client.store().memory().holder("k").as_deref(), Some("token-2"));
    assert!(client.store().count(StoreOp::Acquire) >= 3);
}

#[tokio::test(start_paused = true)]
async fn lock_fails_after_retry_budget() {
    let client = client();
    let _holder = client.try_lock("k", LEASE).await.unwrap();

    let retry = FixedInterval::new(Duration::from_millis(10), 2);
    let err = client
        .lock("k", LEASE, ATTEMPT, retry, &never())
        .await
        .unwrap_err();

    assert!(matches!(err, LockError::RetriesExhausted { attempts: 3, .. }));
    assert!(err.is_contention());
    assert_eq!(client.store().count(StoreOp::Acquire), 3);
}

#[tokio::test(start_paused = true)]
async fn lock_retries_timed_out_attempt() {
    let client = client();
    client.store().push_fault(StoreOp::Acquire, Fault::Hang);

    let start = Instant::now();
    let retry = FixedInterval::new(Duration::from_millis(10), 5);
    let lock = client
        .lock("k", LEASE, ATTEMPT, retry, &never())
        .await
        .unwrap();

    assert_eq!(lock.token(), "token-1");
    assert_eq!(client.store().count(StoreOp::Acquire), 2);
    assert!(start.elapsed() >= ATTEMPT);
}

#[tokio::test(start_paused = true)]
async fn lock_recognises_its_own_lost_reply() {
    let client = client();
    client.store().push_fault(StoreOp::Acquire, Fault::ApplyThenHang);

    let retry = FixedInterval::new(Duration::from_millis(10), 5);
    let lock = client
        .lock("k", LEASE, ATTEMPT, retry, &never())
        .await
        .unwrap();

    let calls = client.store().calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.token() == "token-1"));
    assert_eq!(lock.token(), "token-1");
}

#[tokio::test(start_paused = true)]
async fn lock_exhausts_when_every_attempt_times_out() {
    let client = client();
    for _ in 0..3 {
        client.store().push_fault(StoreOp::Acquire, Fault::Hang);
    }

    let retry = FixedInterval::new(Duration::from_millis(10), 2);
    let err = client
        .lock("k", LEASE, ATTEMPT, retry, &never())
        .await
        .unwrap_err();

    assert!(matches!(err, LockError::RetriesExhausted { attempts: 3, .. }));
    assert!(err.is_contention());
}

#[tokio::test(start_paused = true)]
async fn lock_fails_fast_on_store_error() {
    let client = client();
    client.store().push_fault(
        StoreOp::Acquire,
        Fault::Error(StoreError::Script("NOSCRIPT".to_string())),
    );

    let retry = FixedInterval::new(Duration::from_millis(10), 5);
    let err = client
        .lock("k", LEASE, ATTEMPT, retry, &never())
        .await
        .unwrap_err();

    assert!(matches!(err, LockError::Store(StoreError::Script(_))));
    assert_eq!(client.store().count(StoreOp::Acquire), 1);
}

#[tokio::test(start_paused = true)]
async fn lock_cancelled_mid_retry_returns_promptly() {
    let client = client();
    let _holder = client.try_lock("k", LEASE).await.unwrap();
    let cancel = CancellationToken::new();

    let start = Instant::now();
    let task = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let retry = FixedInterval::forever(Duration::from_secs(1));
            client.lock("k", LEASE, ATTEMPT, retry, &cancel).await
        })
    };

    tokio::time::sleep(Duration::from_millis(2500)).await;
    cancel.cancel();

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err, LockError::Cancelled));
    assert!(start.elapsed() < Duration::from_millis(2500) + ATTEMPT);
}

#[tokio::test(start_paused = true)]
async fn lock_cancelled_during_hung_attempt() {
    let client = client();
    client.store().push_fault(StoreOp::Acquire, Fault::Hang);
    let cancel = CancellationToken::new();

    let start = Instant::now();
    let task = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            client
                .lock("k", LEASE, Duration::from_secs(10), no_retry(), &cancel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();

    assert!(matches!(
        task.await.unwrap().unwrap_err(),
        LockError::Cancelled
    ));
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn lock_already_cancelled_never_touches_store() {
    let client = client();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client
        .lock("k", LEASE, ATTEMPT, no_retry(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, LockError::Cancelled));
    assert!(client.store().calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn lock_with_uses_configured_policy() {
    let client = client();
    let _holder = client.try_lock("k", LEASE).await.unwrap();
    let config = LockConfig::new().with_retry(RetryConfig::Fixed {
        interval: Duration::from_millis(20),
        max_retries: 1,
    });

    let err = client.lock_with("k", &config, &never()).await.unwrap_err();
    assert!(matches!(err, LockError::RetriesExhausted { attempts: 2, .. }));
}

// =============================================================================
// singleflight_lock
// =============================================================================

#[tokio::test(start_paused = true)]
async fn singleflight_shares_one_failed_attempt() {
    let client = client();
    let _holder = client.try_lock("k", LEASE).await.unwrap();
    client.store().set_latency(Duration::from_millis(50));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .singleflight_lock("k", LEASE, ATTEMPT, no_retry(), &never())
                    .await
            })
        })
        .collect();

    for task in tasks {
        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, LockError::RetriesExhausted { attempts: 1, .. }));
    }
    assert_eq!(client.store().count(StoreOp::Acquire), 1);
}

#[tokio::test(start_paused = true)]
async fn singleflight_starts_fresh_after_completion() {
    let client = client();

    let first = client
        .singleflight_lock("k", LEASE, ATTEMPT, no_retry(), &never())
        .await
        .unwrap();
    first.unlock().await.unwrap();

    let second = client
        .singleflight_lock("k", LEASE, ATTEMPT, no_retry(), &never())
        .await
        .unwrap();

    assert_eq!(first.token(), "token-1");
    assert_eq!(second.token(), "token-2");
    assert_eq!(client.store().count(StoreOp::Acquire), 2);
}

#[tokio::test(start_paused = true)]
async fn singleflight_hands_each_lock_to_one_caller() {
    let client = client();
    client.store().set_latency(Duration::from_millis(5));
    let active = Arc::new(AtomicUsize::new(0));
    let max_active = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let client = client.clone();
            let active = Arc::clone(&active);
            let max_active = Arc::clone(&max_active);
            tokio::spawn(async move {
                let retry = FixedInterval::forever(Duration::from_millis(10));
                let lock = client
                    .singleflight_lock("k", LEASE, ATTEMPT, retry, &never())
                    .await?;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                lock.unlock().await?;
                Ok::<_, LockError>(lock.token().to_string())
            })
        })
        .collect();

    let mut tokens = Vec::new();
    for task in tasks {
        tokens.push(task.await.unwrap().unwrap());
    }
    tokens.sort();
    tokens.dedup();

    assert_eq!(tokens.len(), 3);
    assert_eq!(max_active.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn singleflight_follower_cancel_leaves_attempt_running() {
    let client = client();
    let holder = client.try_lock("k", LEASE).await.unwrap();
    let retry = FixedInterval::forever(Duration::from_millis(20));

    let leader = {
        let client = client.clone();
        let retry = retry.clone();
        tokio::spawn(async move {
            client
                .singleflight_lock("k", LEASE, ATTEMPT, retry, &never())
                .await
        })
    };
    tokio::task::yield_now().await;

    let cancel = CancellationToken::new();
    let follower = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            client
                .singleflight_lock("k", LEASE, ATTEMPT, retry, &cancel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    assert!(matches!(
        follower.await.unwrap().unwrap_err(),
        LockError::Cancelled
    ));

    holder.unlock().await.unwrap();
    let lock = leader.await.unwrap().unwrap();
    assert_eq!(lock.token(), "token-2");
}

#[tokio::test(start_paused = true)]
async fn singleflight_releases_lock_nobody_claimed() {
    let client = client();
    let holder = client.try_lock("k", LEASE).await.unwrap();
    let retry = FixedInterval::forever(Duration::from_millis(20));

    let leader_cancel = CancellationToken::new();
    let leader = {
        let client = client.clone();
        let retry = retry.clone();
        let cancel = leader_cancel.clone();
        tokio::spawn(async move {
            client
                .singleflight_lock("k", LEASE, ATTEMPT, retry, &cancel)
                .await
        })
    };
    tokio::task::yield_now().await;

    let follower = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .singleflight_lock("k", LEASE, ATTEMPT, retry, &never())
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    leader_cancel.cancel();
    assert!(matches!(
        leader.await.unwrap().unwrap_err(),
        LockError::Cancelled
    ));

    holder.unlock().await.unwrap();

    // The first attempt's lease (token-2) went back to the store, and the
    // follower won the next attempt.
    let lock = follower.await.unwrap().unwrap();
    assert_eq!(lock.token(), "token-3");
    assert_eq!(client.store().memory().holder("k").as_deref(), Some("token-3"));
    assert_eq!(client.store().count(StoreOp::CompareAndDelete), 2);
}
