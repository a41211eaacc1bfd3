//! EventStore trait definition

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::event::{EventBatch, WorkerRecord};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Worker not found
    #[error("worker not found: {0}")]
    WorkerNotFound(Uuid),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage capability the pool depends on
///
/// Writes from workers are best effort: the pool logs failures and keeps going,
/// so implementations should not retry internally. The read methods serve the
/// API layer and are never called by the pool itself.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Record a worker that just started
    async fn register_worker(&self, worker: WorkerRecord) -> Result<(), StoreError>;

    /// Persist a flushed batch and add its size to the worker's event count.
    /// Empty batches may be ignored.
    async fn append_event_batch(&self, batch: EventBatch) -> Result<(), StoreError>;

    /// Mark a worker as finished
    async fn complete_worker(
        &self,
        worker_id: Uuid,
        finished_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// All workers ever registered
    async fn list_workers(&self) -> Result<Vec<WorkerRecord>, StoreError>;

    /// One worker by ID, `None` if unknown
    async fn get_worker(&self, worker_id: Uuid) -> Result<Option<WorkerRecord>, StoreError>;
}
