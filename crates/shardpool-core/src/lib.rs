//! # Shardpool Core
//!
//! Shard routing and worker pool lifecycle for batched event persistence.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ShardPool                             │
//! │  send(events) ──▶ ShardRouter ──▶ shard queue [0..SHARDS)   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ShardSupervisor (one per shard)              │
//! │  (keeps N workers alive, respawns on idle exit)             │
//! │   [Worker 1] [Worker 2] ... [Worker N]                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        EventStore                            │
//! │  (register_worker, append_event_batch, complete_worker)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use shardpool_core::prelude::*;
//!
//! let store = Arc::new(InMemoryEventStore::new());
//! let pool = ShardPool::start(PoolConfig::from_env(), store);
//!
//! pool.send(events, RoutingMode::PerEvent).await?;
//!
//! // Drains every queue and waits for all supervisors
//! let summaries = pool.shutdown().await?;
//! ```

pub mod config;
pub mod event;
pub mod persistence;
pub mod pool;
pub mod router;

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::PoolConfig;
    pub use crate::event::{Event, EventBatch, WorkerRecord};
    pub use crate::persistence::{EventStore, InMemoryEventStore, StoreError};
    pub use crate::pool::{PoolError, ShardPool, ShardSummary};
    pub use crate::router::{RoutingMode, ShardId, ShardRouter};
}

// Re-export key types at crate root
pub use config::{PoolConfig, BATCH_SIZE, DEFAULT_WORKERS_PER_SHARD, IDLE_TIMEOUT, SHARD_COUNT};
pub use event::{Event, EventBatch, WorkerRecord};
pub use persistence::{EventStore, InMemoryEventStore, StoreError};
pub use pool::{PoolError, ShardPool, ShardSummary};
pub use router::{RoutingMode, ShardId, ShardRouter};
