//! Worker: drains one shard queue into fixed-size batches
//!
//! Each loop iteration waits for whichever comes first, the next event or the
//! idle timer. A full batch is flushed and the loop continues; a closed queue or
//! an elapsed timer flushes the remainder (possibly empty) and ends the worker.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::event::{Event, EventBatch, WorkerRecord};
use crate::persistence::EventStore;
use crate::router::ShardId;

/// Receiving end of a shard queue, shared by all workers of the shard
pub(crate) type ShardQueue = Arc<Mutex<mpsc::Receiver<Event>>>;

/// Why a worker stopped; this is the completion signal its supervisor receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The queue was closed; the worker must not be replaced
    QueueClosed,
    /// No event arrived within the idle timeout; the worker is replaced
    IdleTimeout,
}

impl WorkerExit {
    pub fn queue_closed(self) -> bool {
        matches!(self, Self::QueueClosed)
    }
}

enum Wake {
    Event(Event),
    Closed,
    Idle,
}

pub(crate) struct Worker {
    id: Uuid,
    shard_id: ShardId,
    queue: ShardQueue,
    store: Arc<dyn EventStore>,
    batch_size: usize,
    idle_timeout: Duration,
}

impl Worker {
    pub(crate) fn new(
        shard_id: ShardId,
        queue: ShardQueue,
        store: Arc<dyn EventStore>,
        batch_size: usize,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            shard_id,
            queue,
            store,
            batch_size: batch_size.max(1),
            idle_timeout,
        }
    }

    pub(crate) async fn run(self) -> WorkerExit {
        if let Err(e) = self
            .store
            .register_worker(WorkerRecord::started(self.id, self.shard_id))
            .await
        {
            warn!(worker_id = %self.id, shard_id = self.shard_id, "Failed to register worker: {}", e);
        }
        debug!(worker_id = %self.id, shard_id = self.shard_id, "Worker started");

        let mut batch = Vec::with_capacity(self.batch_size);
        let mut received = 0usize;

        let exit = loop {
            let wake = tokio::select! {
                biased;
                event = next_event(&self.queue) => match event {
                    Some(event) => Wake::Event(event),
                    None => Wake::Closed,
                },
                _ = tokio::time::sleep(self.idle_timeout) => Wake::Idle,
            };

            match wake {
                Wake::Event(event) => {
                    received += 1;
                    batch.push(event);
                    if batch.len() >= self.batch_size {
                        let full = std::mem::replace(&mut batch, Vec::with_capacity(self.batch_size));
                        self.flush(full).await;
                    }
                }
                Wake::Closed => break WorkerExit::QueueClosed,
                Wake::Idle => break WorkerExit::IdleTimeout,
            }
        };

        self.flush(batch).await;

        if let Err(e) = self.store.complete_worker(self.id, Utc::now()).await {
            warn!(worker_id = %self.id, "Failed to record worker completion: {}", e);
        }
        debug!(
            worker_id = %self.id,
            shard_id = self.shard_id,
            received,
            exit = ?exit,
            "Worker finished"
        );

        exit
    }

    async fn flush(&self, events: Vec<Event>) {
        let size = events.len();
        if let Err(e) = self
            .store
            .append_event_batch(EventBatch::new(self.id, events))
            .await
        {
            error!(worker_id = %self.id, size, "Failed to save event batch: {}", e);
            return;
        }
        debug!(worker_id = %self.id, size, "Flushed event batch");
    }
}

async fn next_event(queue: &ShardQueue) -> Option<Event> {
    queue.lock().await.recv().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryEventStore;
    use serde_json::json;

    fn queue(capacity: usize) -> (mpsc::Sender<Event>, ShardQueue) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Arc::new(Mutex::new(rx)))
    }

    fn event(n: usize) -> Event {
        Event::new(Utc::now(), json!({ "n": n }))
    }

    fn worker(queue: ShardQueue, store: Arc<InMemoryEventStore>, timeout: Duration) -> Worker {
        Worker::new(0, queue, store, 5, timeout)
    }

    #[tokio::test]
    async fn test_flushes_full_batches_and_remainder_on_close() {
        let store = Arc::new(InMemoryEventStore::new());
        let (tx, rx) = queue(16);
        for n in 0..12 {
            tx.send(event(n)).await.unwrap();
        }
        drop(tx);

        let exit = worker(rx, store.clone(), Duration::from_secs(60)).run().await;

        assert_eq!(exit, WorkerExit::QueueClosed);
        assert_eq!(store.batch_sizes(), vec![5, 5, 2]);
        let payloads: Vec<u64> = store
            .batches()
            .iter()
            .flat_map(|b| b.events.iter().map(|e| e.data["n"].as_u64().unwrap()))
            .collect();
        assert_eq!(payloads, (0..12).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_exact_multiple_ends_with_empty_flush() {
        let store = Arc::new(InMemoryEventStore::new());
        let (tx, rx) = queue(16);
        for n in 0..5 {
            tx.send(event(n)).await.unwrap();
        }
        drop(tx);

        worker(rx, store.clone(), Duration::from_secs(60)).run().await;
        assert_eq!(store.batch_sizes(), vec![5, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_flushes_partial_batch() {
        let store = Arc::new(InMemoryEventStore::new());
        let (tx, rx) = queue(16);
        tx.send(event(0)).await.unwrap();
        tx.send(event(1)).await.unwrap();

        let exit = worker(rx, store.clone(), Duration::from_secs(1)).run().await;

        assert_eq!(exit, WorkerExit::IdleTimeout);
        assert!(!exit.queue_closed());
        assert_eq!(store.batch_sizes(), vec![2]);
        drop(tx);
    }

    #[tokio::test]
    async fn test_registers_and_completes_record() {
        let store = Arc::new(InMemoryEventStore::new());
        let (tx, rx) = queue(4);
        let w = Worker::new(3, rx, store.clone(), 5, Duration::from_secs(60));
        let id = w.id;
        tx.send(event(0)).await.unwrap();
        drop(tx);

        w.run().await;

        let record = store.get_worker(id).await.unwrap().unwrap();
        assert_eq!(record.shard_id, 3);
        assert_eq!(record.events_count, 1);
        assert!(record.is_finished());
    }

    #[tokio::test]
    async fn test_store_failure_does_not_stop_worker() {
        let store = Arc::new(InMemoryEventStore::new());
        store.set_failing(true);
        let (tx, rx) = queue(16);
        for n in 0..7 {
            tx.send(event(n)).await.unwrap();
        }
        drop(tx);

        let exit = worker(rx, store.clone(), Duration::from_secs(60)).run().await;

        assert_eq!(exit, WorkerExit::QueueClosed);
        assert_eq!(store.total_events(), 0);
        assert_eq!(store.worker_count(), 0);
    }
}
