// Database models (internal, may differ from core types)

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Workers
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct WorkerRow {
    pub id: Uuid,
    pub shard_id: i32,
    pub events_count: i64,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CreateWorker {
    pub id: Uuid,
    pub shard_id: i32,
    pub created_at: DateTime<Utc>,
}

// ============================================
// Event batches
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct EventBatchRow {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub event_count: i32,
    pub events: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateEventBatch {
    pub worker_id: Uuid,
    pub event_count: i32,
    pub events: serde_json::Value,
}
