//! End-to-end pool scenarios against the in-memory store

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use shardpool_core::{
    Event, EventBatch, EventStore, InMemoryEventStore, PoolConfig, RoutingMode, ShardPool,
    StoreError, WorkerRecord, BATCH_SIZE, SHARD_COUNT,
};

/// Event whose timestamp lands on `shard`, tagged with a sequence number
fn event_on_shard(shard: usize, seq: usize) -> Event {
    let secs = (seq * SHARD_COUNT + shard) as i64;
    Event::new(Utc.timestamp_opt(secs, 0).unwrap(), json!({ "seq": seq }))
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// In-memory store whose batch writes take `delay`
struct SlowStore {
    inner: InMemoryEventStore,
    delay: Duration,
}

#[async_trait]
impl EventStore for SlowStore {
    async fn register_worker(&self, worker: WorkerRecord) -> Result<(), StoreError> {
        self.inner.register_worker(worker).await
    }

    async fn append_event_batch(&self, batch: EventBatch) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.append_event_batch(batch).await
    }

    async fn complete_worker(
        &self,
        worker_id: Uuid,
        finished_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.complete_worker(worker_id, finished_at).await
    }

    async fn list_workers(&self) -> Result<Vec<WorkerRecord>, StoreError> {
        self.inner.list_workers().await
    }

    async fn get_worker(&self, worker_id: Uuid) -> Result<Option<WorkerRecord>, StoreError> {
        self.inner.get_worker(worker_id).await
    }
}

fn single_worker_pool(store: Arc<InMemoryEventStore>) -> ShardPool {
    let config = PoolConfig::new()
        .with_workers_per_shard(1)
        .with_idle_timeout(Duration::from_secs(600));
    ShardPool::start(config, store)
}

#[tokio::test]
async fn test_full_batch_before_shutdown_and_remainder_after() {
    let store = Arc::new(InMemoryEventStore::new());
    let pool = single_worker_pool(store.clone());

    let events = (0..6).map(|seq| event_on_shard(0, seq)).collect();
    pool.send(events, RoutingMode::PerEvent).await.unwrap();

    wait_until(|| store.batch_sizes().contains(&5)).await;
    assert_eq!(store.total_events(), 5);

    pool.shutdown().await.unwrap();

    assert_eq!(store.total_events(), 6);
    let shard_zero_worker = store.workers_for_shard(0)[0].id;
    let sizes: Vec<usize> = store
        .batches()
        .iter()
        .filter(|b| b.worker_id == shard_zero_worker)
        .map(|b| b.len())
        .collect();
    assert_eq!(sizes, vec![5, 1]);
}

#[tokio::test]
async fn test_partial_batch_flushed_on_immediate_shutdown() {
    let store = Arc::new(InMemoryEventStore::new());
    let pool = single_worker_pool(store.clone());

    let events = (0..3).map(|seq| event_on_shard(2, seq)).collect();
    pool.send(events, RoutingMode::PerEvent).await.unwrap();
    pool.shutdown().await.unwrap();

    let sizes = store.batch_sizes();
    assert_eq!(sizes.iter().filter(|s| **s == 3).count(), 1);
    assert_eq!(sizes.iter().filter(|s| **s == 5).count(), 0);
    assert_eq!(store.total_events(), 3);
}

#[tokio::test]
async fn test_single_shard_mode_keeps_request_together() {
    let store = Arc::new(InMemoryEventStore::new());
    let pool = single_worker_pool(store.clone());

    let events = (0..SHARD_COUNT).map(|shard| event_on_shard(shard, 0)).collect();
    pool.send(events, RoutingMode::SingleShard).await.unwrap();
    pool.shutdown().await.unwrap();

    let non_empty: Vec<_> = store.batches().into_iter().filter(|b| !b.is_empty()).collect();
    assert_eq!(non_empty.len(), 1);
    assert_eq!(non_empty[0].len(), SHARD_COUNT);
}

#[tokio::test(start_paused = true)]
async fn test_idle_workers_flush_empty_and_respawn() {
    let store = Arc::new(InMemoryEventStore::new());
    let config = PoolConfig::new()
        .with_workers_per_shard(1)
        .with_idle_timeout(Duration::from_secs(1));
    let pool = ShardPool::start(config, store.clone());

    tokio::time::sleep(Duration::from_millis(2500)).await;

    // Every shard retired at least its first worker and kept one running
    for shard in 0..SHARD_COUNT {
        assert!(store.workers_for_shard(shard).len() >= 2);
    }
    assert_eq!(store.active_worker_count(), SHARD_COUNT);
    assert!(!store.batches().is_empty());
    assert!(store.batches().iter().all(|b| b.is_empty()));

    let summaries = pool.shutdown().await.unwrap();
    assert!(summaries.iter().all(|s| s.respawns >= 1));
    assert_eq!(store.active_worker_count(), 0);
}

#[tokio::test]
async fn test_no_loss_no_duplication_under_concurrent_senders() {
    const SENDERS: usize = 8;
    const PER_SENDER: usize = 250;

    let store = Arc::new(InMemoryEventStore::new());
    let pool = Arc::new(ShardPool::start(PoolConfig::new(), store.clone()));

    let mut handles = Vec::new();
    for sender in 0..SENDERS {
        let pool = Arc::clone(&pool);
        handles.push(tokio::spawn(async move {
            for chunk in 0..(PER_SENDER / 10) {
                let events = (0..10)
                    .map(|i| {
                        let seq = sender * PER_SENDER + chunk * 10 + i;
                        event_on_shard(seq % SHARD_COUNT, seq)
                    })
                    .collect();
                let mode = RoutingMode::from_flag(chunk % 3 == 0);
                pool.send(events, mode).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    pool.shutdown().await.unwrap();

    let total = SENDERS * PER_SENDER;
    assert_eq!(store.total_events(), total);

    let mut seen: Vec<u64> = store
        .batches()
        .iter()
        .flat_map(|b| b.events.iter().map(|e| e.data["seq"].as_u64().unwrap()))
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..total as u64).collect::<Vec<_>>());

    // Every flush but a worker's last is a full batch
    let mut per_worker: HashMap<Uuid, Vec<usize>> = HashMap::new();
    for batch in store.batches() {
        per_worker.entry(batch.worker_id).or_default().push(batch.len());
    }
    for sizes in per_worker.values() {
        let (last, full) = sizes.split_last().unwrap();
        assert!(full.iter().all(|s| *s == BATCH_SIZE));
        assert!(*last < BATCH_SIZE);
    }

    let counted: u64 = store
        .list_workers()
        .await
        .unwrap()
        .iter()
        .map(|w| w.events_count)
        .sum();
    assert_eq!(counted, total as u64);
}

#[tokio::test]
async fn test_store_outage_does_not_block_shutdown() {
    let store = Arc::new(InMemoryEventStore::new());
    store.set_failing(true);
    let pool = ShardPool::start(PoolConfig::new(), store.clone());

    let events = (0..20).map(|seq| event_on_shard(seq % SHARD_COUNT, seq)).collect();
    pool.send(events, RoutingMode::PerEvent).await.unwrap();

    let summaries = tokio::time::timeout(Duration::from_secs(5), pool.shutdown())
        .await
        .expect("shutdown hung")
        .unwrap();

    assert_eq!(summaries.len(), SHARD_COUNT);
    assert_eq!(store.total_events(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_send_blocked_at_shutdown_is_drained() {
    const SENT: usize = 12;

    let store = Arc::new(SlowStore {
        inner: InMemoryEventStore::new(),
        delay: Duration::from_millis(100),
    });
    let config = PoolConfig::new()
        .with_workers_per_shard(1)
        .with_queue_capacity(1)
        .with_idle_timeout(Duration::from_secs(600));
    let pool = Arc::new(ShardPool::start(config, store.clone()));

    let sender = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            let events = (0..SENT).map(|seq| event_on_shard(0, seq)).collect();
            pool.send(events, RoutingMode::PerEvent).await
        })
    };

    // The shard 0 worker is stuck writing its first batch and the queue is full
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!sender.is_finished());
    assert_eq!(store.inner.total_events(), 0);

    pool.shutdown().await.unwrap();

    assert_eq!(sender.await.unwrap().unwrap(), SENT);
    assert_eq!(store.inner.total_events(), SENT);
    let shard_zero_worker = store.inner.workers_for_shard(0)[0].id;
    let sizes: Vec<usize> = store
        .inner
        .batches()
        .iter()
        .filter(|b| b.worker_id == shard_zero_worker)
        .map(|b| b.len())
        .collect();
    assert_eq!(sizes, vec![5, 5, 2]);
}
