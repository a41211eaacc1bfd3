// Repository layer for database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ============================================
    // Workers
    // ============================================

    pub async fn create_worker(&self, input: CreateWorker) -> Result<WorkerRow> {
        let row = sqlx::query_as::<_, WorkerRow>(
            r#"
            INSERT INTO shard_workers (id, shard_id, events_count, created_at)
            VALUES ($1, $2, 0, $3)
            RETURNING id, shard_id, events_count, created_at, finished_at
            "#,
        )
        .bind(input.id)
        .bind(input.shard_id)
        .bind(input.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Returns false when no worker has this ID
    pub async fn finish_worker(&self, id: Uuid, finished_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE shard_workers
            SET finished_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(finished_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_worker(&self, id: Uuid) -> Result<Option<WorkerRow>> {
        let row = sqlx::query_as::<_, WorkerRow>(
            r#"
            SELECT id, shard_id, events_count, created_at, finished_at
            FROM shard_workers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_workers(&self) -> Result<Vec<WorkerRow>> {
        let rows = sqlx::query_as::<_, WorkerRow>(
            r#"
            SELECT id, shard_id, events_count, created_at, finished_at
            FROM shard_workers
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ============================================
    // Event batches
    // ============================================

    /// Insert a batch and bump the worker's event count in one transaction
    pub async fn insert_event_batch(&self, input: CreateEventBatch) -> Result<EventBatchRow> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, EventBatchRow>(
            r#"
            INSERT INTO event_batches (id, worker_id, event_count, events)
            VALUES ($1, $2, $3, $4)
            RETURNING id, worker_id, event_count, events, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.worker_id)
        .bind(input.event_count)
        .bind(&input.events)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE shard_workers
            SET events_count = events_count + $2
            WHERE id = $1
            "#,
        )
        .bind(input.worker_id)
        .bind(i64::from(input.event_count))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    pub async fn list_event_batches_for_worker(
        &self,
        worker_id: Uuid,
    ) -> Result<Vec<EventBatchRow>> {
        let rows = sqlx::query_as::<_, EventBatchRow>(
            r#"
            SELECT id, worker_id, event_count, events, created_at
            FROM event_batches
            WHERE worker_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
