//! Concurrency semantics of the aggregator
//!
//! Stores that never answer, and reads that lose the race but keep running.
//! Run with: cargo test --test race_semantics_tests

use async_trait::async_trait;
use multistore::{MemoryStore, MultiStore, Store, StoreHandle, StoreResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_test::assert_ok;

/// Never resolves.
struct HungStore;

#[async_trait]
impl Store<u32> for HungStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<u32>> {
        std::future::pending().await
    }

    async fn set(&self, _key: &str, _value: u32) -> StoreResult<()> {
        std::future::pending().await
    }
}

/// Answers "absent" after a delay and records that it finished.
struct SlowMiss {
    delay: Duration,
    finished: AtomicBool,
}

#[async_trait]
impl Store<u32> for SlowMiss {
    async fn get(&self, _key: &str) -> StoreResult<Option<u32>> {
        sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: u32) -> StoreResult<()> {
        sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Counts concurrent in-flight calls.
#[derive(Default)]
struct Gauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl Store<u32> for Gauge {
    async fn get(&self, _key: &str) -> StoreResult<Option<u32>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: u32) -> StoreResult<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_hung_store_does_not_block_found_value() {
    let fast = Arc::new(MemoryStore::<u32>::new("fast"));
    fast.insert("k", 9).await;
    let stores: Vec<StoreHandle<u32>> = vec![Arc::new(HungStore), fast];
    let multi = MultiStore::new(stores).unwrap();

    let result = timeout(Duration::from_secs(1), multi.get("k")).await;

    assert_eq!(assert_ok!(result), Ok(Some(9)));
}

#[tokio::test(start_paused = true)]
async fn test_hung_store_blocks_get_without_value() {
    let empty = Arc::new(MemoryStore::<u32>::new("empty"));
    let stores: Vec<StoreHandle<u32>> = vec![Arc::new(HungStore), empty];
    let multi = MultiStore::new(stores).unwrap();

    let result = timeout(Duration::from_secs(1), multi.get("k")).await;

    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_hung_store_blocks_set() {
    let healthy = Arc::new(MemoryStore::<u32>::new("healthy"));
    let stores: Vec<StoreHandle<u32>> = vec![healthy.clone(), Arc::new(HungStore)];
    let multi = MultiStore::new(stores).unwrap();

    let result = timeout(Duration::from_secs(1), multi.set("k", 3)).await;

    assert!(result.is_err());
    assert_eq!(healthy.peek("k").await, Some(3));
}

#[tokio::test(start_paused = true)]
async fn test_losing_read_keeps_running() {
    let fast = Arc::new(MemoryStore::<u32>::new("fast"));
    fast.insert("k", 1).await;
    let slow = Arc::new(SlowMiss {
        delay: Duration::from_millis(50),
        finished: AtomicBool::new(false),
    });
    let stores: Vec<StoreHandle<u32>> = vec![slow.clone(), fast];
    let multi = MultiStore::new(stores).unwrap();

    assert_eq!(multi.get("k").await, Ok(Some(1)));
    assert!(!slow.finished.load(Ordering::SeqCst));

    sleep(Duration::from_millis(100)).await;
    assert!(slow.finished.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_stores_are_called_concurrently() {
    let gauge = Arc::new(Gauge::default());
    let stores: Vec<StoreHandle<u32>> = vec![gauge.clone(), gauge.clone(), gauge.clone()];
    let multi = MultiStore::new(stores).unwrap();

    assert_eq!(multi.get("k").await, Ok(None));
    assert_eq!(gauge.peak.load(Ordering::SeqCst), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_aggregator() {
    let store = Arc::new(MemoryStore::<u32>::new("shared"));
    let stores: Vec<StoreHandle<u32>> = vec![store.clone(), Arc::new(MemoryStore::<u32>::new("b"))];
    let multi = MultiStore::new(stores).unwrap();

    let mut handles = vec![];
    for task_id in 0..8u32 {
        let multi = multi.clone();
        handles.push(tokio::spawn(async move {
            let key = format!("key_{}", task_id);
            multi.set(&key, task_id).await.unwrap();
            assert_eq!(multi.get(&key).await.unwrap(), Some(task_id));
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(store.len().await, 8);
}
