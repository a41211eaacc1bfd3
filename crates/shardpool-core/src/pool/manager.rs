//! Shard pool manager
//!
//! Created once at process start. Owns the sending half of every shard queue and
//! the supervisor task handles, which together form the shutdown barrier.

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use super::supervisor::ShardSupervisor;
use super::{PoolError, ShardSummary};
use crate::config::PoolConfig;
use crate::event::Event;
use crate::persistence::EventStore;
use crate::router::{RoutingMode, ShardRouter};

/// Sharded worker pool
///
/// # Example
///
/// ```ignore
/// use shardpool_core::{PoolConfig, RoutingMode, ShardPool};
///
/// let pool = ShardPool::start(PoolConfig::from_env(), store);
///
/// pool.send(events, RoutingMode::PerEvent).await?;
///
/// // Close every queue and wait until all of them are drained
/// let summaries = pool.shutdown().await?;
/// ```
pub struct ShardPool {
    config: PoolConfig,
    router: ShardRouter,
    senders: RwLock<Option<Vec<mpsc::Sender<Event>>>>,
    supervisors: Mutex<Vec<JoinHandle<ShardSummary>>>,
}

impl ShardPool {
    /// Create the shard queues and start one supervisor per shard.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: PoolConfig, store: Arc<dyn EventStore>) -> Self {
        let router = ShardRouter::new(config.shard_count);
        let mut senders = Vec::with_capacity(router.shard_count());
        let mut supervisors = Vec::with_capacity(router.shard_count());

        for shard_id in 0..router.shard_count() {
            let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
            let supervisor = ShardSupervisor::new(
                shard_id,
                Arc::new(tokio::sync::Mutex::new(rx)),
                tx.downgrade(),
                Arc::clone(&store),
                config.clone(),
            );
            senders.push(tx);
            supervisors.push(tokio::spawn(supervisor.run()));
        }

        info!(
            shards = router.shard_count(),
            workers_per_shard = config.workers_per_shard,
            batch_size = config.batch_size,
            idle_timeout_ms = config.idle_timeout.as_millis() as u64,
            "Shard pool started"
        );

        Self {
            config,
            router,
            senders: RwLock::new(Some(senders)),
            supervisors: Mutex::new(supervisors),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn router(&self) -> ShardRouter {
        self.router
    }

    /// Whether shutdown has been requested
    pub fn is_shut_down(&self) -> bool {
        self.senders.read().is_none()
    }

    /// Route and enqueue a batch of events.
    ///
    /// Waits while a shard queue is full. A send already running when shutdown
    /// starts still completes, and its events are drained before shutdown returns.
    pub async fn send(&self, events: Vec<Event>, mode: RoutingMode) -> Result<usize, PoolError> {
        let senders = self
            .senders
            .read()
            .as_ref()
            .cloned()
            .ok_or(PoolError::ShutDown)?;

        let count = events.len();
        for (shard, event) in self.router.assign(events, mode) {
            senders[shard]
                .send(event)
                .await
                .map_err(|_| PoolError::QueueClosed(shard))?;
        }

        debug!(count, mode = ?mode, "Events enqueued");
        Ok(count)
    }

    /// Close every shard queue and wait for all supervisors to finish.
    ///
    /// Only the first call shuts the pool down; later calls return
    /// [`PoolError::AlreadyShutDown`].
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<Vec<ShardSummary>, PoolError> {
        let senders = self
            .senders
            .write()
            .take()
            .ok_or(PoolError::AlreadyShutDown)?;

        info!("Shutting down shard pool");
        drop(senders);

        let handles = std::mem::take(&mut *self.supervisors.lock());
        let mut summaries = Vec::with_capacity(handles.len());
        for (shard, joined) in join_all(handles).await.into_iter().enumerate() {
            let summary = joined.map_err(|e| PoolError::Supervisor {
                shard,
                message: e.to_string(),
            })?;
            summaries.push(summary);
        }

        info!(shards = summaries.len(), "Shard pool shut down");
        Ok(summaries)
    }
}
