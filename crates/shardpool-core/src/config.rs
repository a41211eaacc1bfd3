//! Pool configuration
//!
//! Only the number of workers per shard comes from the environment. Shard count,
//! batch size and idle timeout are fixed for the process lifetime; the builder
//! methods exist so tests can shorten the idle timeout.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of shard queues created at pool start
pub const SHARD_COUNT: usize = 5;

/// Events per full batch
pub const BATCH_SIZE: usize = 5;

/// How long a worker waits for an event before retiring
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Workers per shard when `WORKERS_MAX` is unset or invalid
pub const DEFAULT_WORKERS_PER_SHARD: usize = 3;

/// Bounded capacity of each shard queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Environment variable holding the workers-per-shard count
pub const WORKERS_MAX_ENV: &str = "WORKERS_MAX";

/// Shard pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of shards (and shard queues)
    pub shard_count: usize,

    /// Workers kept alive per shard
    pub workers_per_shard: usize,

    /// Events per full batch
    pub batch_size: usize,

    /// Idle time after which a worker flushes and retires
    #[serde(with = "duration_millis")]
    pub idle_timeout: Duration,

    /// Capacity of each shard queue; senders wait when it is full
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            shard_count: SHARD_COUNT,
            workers_per_shard: DEFAULT_WORKERS_PER_SHARD,
            batch_size: BATCH_SIZE,
            idle_timeout: IDLE_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            workers_per_shard: parse_workers(std::env::var(WORKERS_MAX_ENV).ok().as_deref()),
            ..Self::default()
        }
    }

    /// Set the number of workers per shard
    pub fn with_workers_per_shard(mut self, workers: usize) -> Self {
        self.workers_per_shard = workers.max(1);
        self
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the shard queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

fn parse_workers(value: Option<&str>) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_WORKERS_PER_SHARD)
}

/// Serde support for Duration as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
