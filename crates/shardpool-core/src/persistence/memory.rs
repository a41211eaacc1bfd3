//! In-memory implementation of EventStore for testing and dev mode

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::store::*;
use crate::event::{EventBatch, WorkerRecord};
use crate::router::ShardId;

/// In-memory implementation of EventStore
///
/// Unlike the Postgres store it keeps empty batches too, so tests can observe
/// every flush a worker performs. All data is lost on restart.
///
/// # Example
///
/// ```
/// use shardpool_core::InMemoryEventStore;
///
/// let store = InMemoryEventStore::new();
/// assert_eq!(store.worker_count(), 0);
/// ```
#[derive(Default)]
pub struct InMemoryEventStore {
    workers: RwLock<HashMap<Uuid, WorkerRecord>>,
    batches: RwLock<Vec<EventBatch>>,
    failing: AtomicBool,
}

impl InMemoryEventStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a database error until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of registered workers
    pub fn worker_count(&self) -> usize {
        self.workers.read().len()
    }

    /// Registered workers of one shard
    pub fn workers_for_shard(&self, shard_id: ShardId) -> Vec<WorkerRecord> {
        self.workers
            .read()
            .values()
            .filter(|w| w.shard_id == shard_id)
            .cloned()
            .collect()
    }

    /// Workers registered and not yet completed
    pub fn active_worker_count(&self) -> usize {
        self.workers
            .read()
            .values()
            .filter(|w| !w.is_finished())
            .count()
    }

    /// Every flushed batch, in flush order
    pub fn batches(&self) -> Vec<EventBatch> {
        self.batches.read().clone()
    }

    /// Sizes of every flushed batch, in flush order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.read().iter().map(EventBatch::len).collect()
    }

    /// Total events across all batches
    pub fn total_events(&self) -> usize {
        self.batches.read().iter().map(EventBatch::len).sum()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn register_worker(&self, worker: WorkerRecord) -> Result<(), StoreError> {
        self.check_available()?;
        self.workers.write().insert(worker.id, worker);
        Ok(())
    }

    async fn append_event_batch(&self, batch: EventBatch) -> Result<(), StoreError> {
        self.check_available()?;
        if let Some(worker) = self.workers.write().get_mut(&batch.worker_id) {
            worker.events_count += batch.len() as u64;
        }
        self.batches.write().push(batch);
        Ok(())
    }

    async fn complete_worker(
        &self,
        worker_id: Uuid,
        finished_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut workers = self.workers.write();
        let worker = workers
            .get_mut(&worker_id)
            .ok_or(StoreError::WorkerNotFound(worker_id))?;
        worker.finished_at = Some(finished_at);
        Ok(())
    }

    async fn list_workers(&self) -> Result<Vec<WorkerRecord>, StoreError> {
        self.check_available()?;
        let mut workers: Vec<WorkerRecord> = self.workers.read().values().cloned().collect();
        workers.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(workers)
    }

    async fn get_worker(&self, worker_id: Uuid) -> Result<Option<WorkerRecord>, StoreError> {
        self.check_available()?;
        Ok(self.workers.read().get(&worker_id).cloned())
    }
}
