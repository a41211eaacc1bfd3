// Database-backed EventStore implementation
//
// Workers write through this store: one row per worker in shard_workers and
// one row per flushed batch in event_batches, with the events kept as JSONB.
// Empty batches are not written.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shardpool_core::{EventBatch, EventStore, StoreError, WorkerRecord};
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::models::{CreateEventBatch, CreateWorker, WorkerRow};
use crate::repositories::Database;

/// Database-backed event store
#[derive(Clone)]
pub struct DbEventStore {
    db: Database,
}

impl DbEventStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Connect to Postgres and apply migrations
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = Database::from_url(database_url)
            .await
            .context("Failed to connect to database")?;
        db.migrate().await.context("Failed to run migrations")?;
        Ok(Self { db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn db_error(context: &str, e: anyhow::Error) -> StoreError {
    error!("{}: {:#}", context, e);
    StoreError::Database(e.to_string())
}

fn row_to_record(row: WorkerRow) -> Result<WorkerRecord, StoreError> {
    Ok(WorkerRecord {
        id: row.id,
        shard_id: usize::try_from(row.shard_id)
            .map_err(|_| StoreError::Serialization(format!("negative shard id {}", row.shard_id)))?,
        events_count: u64::try_from(row.events_count).unwrap_or_default(),
        created_at: row.created_at,
        finished_at: row.finished_at,
    })
}

#[async_trait]
impl EventStore for DbEventStore {
    #[instrument(skip(self, worker), fields(worker_id = %worker.id))]
    async fn register_worker(&self, worker: WorkerRecord) -> Result<(), StoreError> {
        let shard_id = i32::try_from(worker.shard_id)
            .map_err(|_| StoreError::Serialization(format!("shard id {} out of range", worker.shard_id)))?;

        self.db
            .create_worker(CreateWorker {
                id: worker.id,
                shard_id,
                created_at: worker.created_at,
            })
            .await
            .map_err(|e| db_error("Failed to register worker", e))?;

        debug!("registered worker");
        Ok(())
    }

    #[instrument(skip(self, batch), fields(worker_id = %batch.worker_id, size = batch.len()))]
    async fn append_event_batch(&self, batch: EventBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let event_count = i32::try_from(batch.len())
            .map_err(|_| StoreError::Serialization("batch too large".to_string()))?;
        let events = serde_json::to_value(&batch.events)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.db
            .insert_event_batch(CreateEventBatch {
                worker_id: batch.worker_id,
                event_count,
                events,
            })
            .await
            .map_err(|e| db_error("Failed to save event batch", e))?;

        debug!("saved event batch");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn complete_worker(
        &self,
        worker_id: Uuid,
        finished_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let found = self
            .db
            .finish_worker(worker_id, finished_at)
            .await
            .map_err(|e| db_error("Failed to complete worker", e))?;

        if !found {
            return Err(StoreError::WorkerNotFound(worker_id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_workers(&self) -> Result<Vec<WorkerRecord>, StoreError> {
        let rows = self
            .db
            .list_workers()
            .await
            .map_err(|e| db_error("Failed to list workers", e))?;

        rows.into_iter().map(row_to_record).collect()
    }

    #[instrument(skip(self))]
    async fn get_worker(&self, worker_id: Uuid) -> Result<Option<WorkerRecord>, StoreError> {
        let row = self
            .db
            .get_worker(worker_id)
            .await
            .map_err(|e| db_error("Failed to get worker", e))?;

        row.map(row_to_record).transpose()
    }
}
