//! Shard supervisor: keeps a shard's worker population stable
//!
//! Worker tasks live in a `JoinSet`; a finished join is the worker's completion
//! signal. The decision of what to do with each signal is a small state machine
//! kept separate from the task plumbing so it can be tested without time.

use std::sync::Arc;

use tokio::sync::mpsc::WeakSender;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, instrument};

use super::worker::{ShardQueue, Worker, WorkerExit};
use super::ShardSummary;
use crate::config::PoolConfig;
use crate::event::Event;
use crate::persistence::EventStore;
use crate::router::ShardId;

/// Supervisor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SupervisorState {
    /// Queue open; idle workers are replaced
    Running { pending: usize },
    /// Queue closed; waiting for the remaining workers, no spawns
    Draining { pending: usize },
    /// All workers exited
    Done,
}

/// What the supervisor does after a worker exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SupervisorAction {
    /// Start a replacement worker
    Respawn,
    /// Let the worker go without replacement
    Retire,
    /// Last worker gone; report and stop
    Finish,
}

impl SupervisorState {
    pub(crate) fn new(workers: usize) -> Self {
        if workers == 0 {
            Self::Done
        } else {
            Self::Running { pending: workers }
        }
    }

    pub(crate) fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Apply one worker completion signal
    pub(crate) fn on_worker_exit(&mut self, queue_closed: bool) -> SupervisorAction {
        match *self {
            Self::Running { .. } if !queue_closed => SupervisorAction::Respawn,
            Self::Running { pending } | Self::Draining { pending } => {
                let pending = pending.saturating_sub(1);
                if pending == 0 {
                    *self = Self::Done;
                    SupervisorAction::Finish
                } else {
                    *self = Self::Draining { pending };
                    SupervisorAction::Retire
                }
            }
            Self::Done => SupervisorAction::Finish,
        }
    }
}

pub(crate) struct ShardSupervisor {
    shard_id: ShardId,
    queue: ShardQueue,
    /// Observes the queue's senders without keeping the queue open
    sender: WeakSender<Event>,
    store: Arc<dyn EventStore>,
    config: PoolConfig,
}

impl ShardSupervisor {
    pub(crate) fn new(
        shard_id: ShardId,
        queue: ShardQueue,
        sender: WeakSender<Event>,
        store: Arc<dyn EventStore>,
        config: PoolConfig,
    ) -> Self {
        Self {
            shard_id,
            queue,
            sender,
            store,
            config,
        }
    }

    #[instrument(skip(self), fields(shard_id = self.shard_id))]
    pub(crate) async fn run(self) -> ShardSummary {
        let mut state = SupervisorState::new(self.config.workers_per_shard);
        let mut workers = JoinSet::new();
        let mut summary = ShardSummary {
            shard_id: self.shard_id,
            workers_spawned: 0,
            respawns: 0,
        };

        for _ in 0..self.config.workers_per_shard {
            self.spawn_worker(&mut workers);
            summary.workers_spawned += 1;
        }

        while !state.is_done() {
            let Some(joined) = workers.join_next().await else {
                error!("Worker set emptied before the shard drained");
                break;
            };
            let queue_closed = match joined {
                Ok(exit) => exit.queue_closed(),
                Err(e) => {
                    worker_failed(self.shard_id, e);
                    self.queue_closed()
                }
            };

            match state.on_worker_exit(queue_closed) {
                SupervisorAction::Respawn => {
                    debug!("Replacing idle worker");
                    self.spawn_worker(&mut workers);
                    summary.workers_spawned += 1;
                    summary.respawns += 1;
                }
                SupervisorAction::Retire => {}
                SupervisorAction::Finish => break,
            }
        }

        info!(
            workers_spawned = summary.workers_spawned,
            respawns = summary.respawns,
            "Shard drained"
        );
        summary
    }

    /// True once every sender of the shard queue has been dropped
    fn queue_closed(&self) -> bool {
        self.sender.upgrade().is_none()
    }

    fn spawn_worker(&self, workers: &mut JoinSet<WorkerExit>) {
        let worker = Worker::new(
            self.shard_id,
            Arc::clone(&self.queue),
            Arc::clone(&self.store),
            self.config.batch_size,
            self.config.idle_timeout,
        );
        workers.spawn(worker.run());
    }
}

/// A worker task that panicked still counts as a completion. It is replaced
/// while the queue is open and retired once the queue is closed.
fn worker_failed(shard_id: ShardId, e: JoinError) {
    error!(shard_id, "Worker task failed: {}", e);
}
