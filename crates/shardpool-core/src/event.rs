//! Event, batch and worker record types
//!
//! Events are immutable once decoded; a batch is built at flush time and handed
//! to the store without the pool keeping a copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::router::ShardId;

/// A single timestamped event with an opaque payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Event {
    /// When the event happened; also drives shard routing
    pub timestamp: DateTime<Utc>,
    /// Opaque payload, stored as-is
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub data: serde_json::Value,
}

impl Event {
    pub fn new(timestamp: DateTime<Utc>, data: serde_json::Value) -> Self {
        Self { timestamp, data }
    }
}

/// Events flushed together by one worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    pub worker_id: Uuid,
    pub events: Vec<Event>,
}

impl EventBatch {
    pub fn new(worker_id: Uuid, events: Vec<Event>) -> Self {
        Self { worker_id, events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Persisted identity of a worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct WorkerRecord {
    /// Worker ID (UUID v7)
    pub id: Uuid,
    /// Shard the worker drains
    pub shard_id: ShardId,
    /// Events flushed by this worker so far
    pub events_count: u64,
    /// When the worker started
    pub created_at: DateTime<Utc>,
    /// When the worker exited, if it has
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkerRecord {
    /// Record for a worker that is starting now
    pub fn started(id: Uuid, shard_id: ShardId) -> Self {
        Self {
            id,
            shard_id,
            events_count: 0,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}
