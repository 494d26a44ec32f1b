use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use unit_peek::{Condition, State};
use unit_trace::sync::{Mutex, mpsc};
use unit_trace::{Tracker, spawn_tracked};

fn three_waiters(tracker: &Tracker, lock: &Arc<Mutex<u32>>) -> Vec<JoinHandle<()>> {
    (0..3)
        .map(|_| {
            let lock = lock.clone();
            spawn_tracked!(tracker, async move {
                *lock.lock().await += 1;
            })
        })
        .collect()
}

async fn waits_for_three_waiters() {
    let tracker = Tracker::new();
    let lock = Arc::new(Mutex::new(0));
    let guard = lock.lock().await;
    let handles = three_waiters(&tracker, &lock);

    let mut cond = Condition::new(&tracker);
    cond.created_by_matching(r"^lock_contention::three_waiters$")
        .unwrap()
        .state_is(State::WaitingLock)
        .count_eq(3);

    let units = cond.wait(Duration::from_secs(1)).await.unwrap();
    assert_eq!(units.len(), 3);
    for unit in &units {
        assert_eq!(unit.reason, "semacquire");
        assert_eq!(unit.top_frame().unwrap().func, "unit_trace::sync::Mutex::lock");
        assert!(!unit.locked);
    }

    drop(guard);
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(*lock.lock().await, 3);
    assert!(tracker.is_empty());
    assert!(cond.eval().unwrap().is_empty());
}

#[tokio::test]
async fn test_three_waiters_current_thread() {
    waits_for_three_waiters().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_three_waiters_multi_thread() {
    waits_for_three_waiters().await;
}

#[tokio::test]
async fn test_times_out_without_syscall_or_io_units() {
    let tracker = Tracker::new();
    let sleepers: Vec<_> = (0..2)
        .map(|_| spawn_tracked!(tracker, unit_trace::time::sleep(Duration::from_secs(60))))
        .collect();

    let timeout = Duration::from_millis(1);
    let start = Instant::now();
    let err = Condition::new(&tracker)
        .count_gt(1)
        .state_in(&[State::SysCall, State::WaitingIO])
        .wait(timeout)
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(start.elapsed() < timeout + Duration::from_secs(1));

    for sleeper in sleepers {
        sleeper.abort();
    }
}

#[tokio::test]
async fn test_lock_holder_is_flagged() {
    let tracker = Tracker::new();
    let lock = Arc::new(Mutex::new(0));
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

    let holder = spawn_tracked!(tracker, {
        let lock = lock.clone();
        async move {
            let _guard = lock.lock().await;
            let _ = release_rx.await;
        }
    });
    let waiters = three_waiters(&tracker, &lock);

    let mut cond = Condition::new(&tracker);
    cond.state_is(State::WaitingLock).count_eq(3);
    cond.wait(Duration::from_secs(1)).await.unwrap();

    let holders = Condition::new(&tracker)
        .holding_lock()
        .count_eq(1)
        .wait(Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(holders[0].reason, "running");

    release_tx.send(()).unwrap();
    holder.await.unwrap();
    for waiter in waiters {
        waiter.await.unwrap();
    }
    assert_eq!(*lock.lock().await, 3);
}

#[tokio::test]
async fn test_channel_receivers_and_sleepers() {
    let tracker = Tracker::new();
    let mut senders = Vec::new();
    let mut handles = Vec::new();

    for _ in 0..2 {
        let (tx, mut rx) = mpsc::channel::<u8>(1);
        senders.push(tx);
        handles.push(spawn_tracked!(tracker, async move {
            while rx.recv().await.is_some() {}
        }));
    }
    let sleeper = spawn_tracked!(tracker, unit_trace::time::sleep(Duration::from_secs(60)));

    let receivers = Condition::new(&tracker)
        .state_is(State::WaitingChannel)
        .count_eq(2)
        .wait(Duration::from_secs(1))
        .await
        .unwrap();
    assert!(receivers.iter().all(|unit| unit.reason == "chan receive"));

    let sleeping = Condition::new(&tracker)
        .state_is_not(State::WaitingChannel)
        .state_is(State::Sleeping)
        .wait(Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(sleeping.len(), 1);
    assert_eq!(sleeping[0].top_frame().unwrap().func, "unit_trace::time::sleep");

    drop(senders);
    for handle in handles {
        handle.await.unwrap();
    }
    sleeper.abort();
}
