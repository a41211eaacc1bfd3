//! Shard pool: queues, supervisors and rotating workers
//!
//! This module provides:
//! - [`ShardPool`] - owns the shard queues, routes and enqueues events, drains on shutdown
//! - `ShardSupervisor` - keeps a fixed number of workers alive per shard
//! - `Worker` - drains a shard queue into batches of [`crate::BATCH_SIZE`]
//!
//! # Lifecycle
//!
//! ```text
//!  Worker exit            Supervisor
//!  ───────────            ──────────
//!  idle timeout   ──▶  Running: spawn replacement
//!  queue closed   ──▶  Draining: pending -= 1, no more spawns
//!                      pending == 0 ──▶ Done ──▶ ShardSummary
//! ```
//!
//! Shutdown drops every queue sender. Workers only see the closed queue after all
//! previously enqueued events were received, so nothing accepted is lost.

mod manager;
mod supervisor;
mod worker;

use serde::Serialize;

use crate::router::ShardId;

pub use manager::ShardPool;
pub use worker::WorkerExit;

/// Pool errors
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Events were sent after shutdown
    #[error("shard pool is shut down")]
    ShutDown,

    /// Shutdown was requested twice
    #[error("shard pool shutdown was already requested")]
    AlreadyShutDown,

    /// A shard queue lost its receiver
    #[error("queue for shard {0} is closed")]
    QueueClosed(ShardId),

    /// A supervisor task failed
    #[error("supervisor for shard {shard} failed: {message}")]
    Supervisor { shard: ShardId, message: String },
}

/// What a shard supervisor did over its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShardSummary {
    pub shard_id: ShardId,
    /// Workers started, initial ones included
    pub workers_spawned: usize,
    /// Workers started to replace an idle or failed one
    pub respawns: usize,
}
