//! Event to shard routing
//!
//! By default each event lands on `unix_seconds(timestamp) mod shard_count`, so a
//! single request may fan out over several shards. In single-shard mode the shard
//! is picked once per request from the wall clock and every event of the request
//! goes there, trading parallelism for per-request ordering.

use chrono::{DateTime, Utc};

use crate::event::Event;

/// Shard index in `[0, shard_count)`
pub type ShardId = usize;

/// How the events of one request are spread over shards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingMode {
    /// Route each event by its own timestamp
    #[default]
    PerEvent,
    /// Route the whole request to one shard chosen from the current time
    SingleShard,
}

impl RoutingMode {
    pub fn from_flag(single_shard: bool) -> Self {
        if single_shard {
            Self::SingleShard
        } else {
            Self::PerEvent
        }
    }
}

/// Maps events to shard ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRouter {
    shard_count: usize,
}

impl ShardRouter {
    /// Create a router over `shard_count` shards (at least one)
    pub fn new(shard_count: usize) -> Self {
        Self {
            shard_count: shard_count.max(1),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// Shard for a timestamp; pre-epoch seconds wrap with a Euclidean remainder
    pub fn shard_for(&self, timestamp: DateTime<Utc>) -> ShardId {
        timestamp.timestamp().rem_euclid(self.shard_count as i64) as ShardId
    }

    /// Shard for a single event in per-event mode
    pub fn route(&self, event: &Event) -> ShardId {
        self.shard_for(event.timestamp)
    }

    /// Pair every event of a request with its shard, using the current time for
    /// single-shard mode
    pub fn assign(&self, events: Vec<Event>, mode: RoutingMode) -> Vec<(ShardId, Event)> {
        self.assign_at(events, mode, Utc::now())
    }

    /// Same as [`ShardRouter::assign`] with an explicit routing clock
    pub fn assign_at(
        &self,
        events: Vec<Event>,
        mode: RoutingMode,
        now: DateTime<Utc>,
    ) -> Vec<(ShardId, Event)> {
        match mode {
            RoutingMode::PerEvent => events.into_iter().map(|e| (self.route(&e), e)).collect(),
            RoutingMode::SingleShard => {
                let shard = self.shard_for(now);
                events.into_iter().map(|e| (shard, e)).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;

    fn event_at(secs: i64) -> Event {
        Event::new(Utc.timestamp_opt(secs, 0).unwrap(), Value::Null)
    }

    #[test]
    fn test_route_by_unix_seconds() {
        let router = ShardRouter::new(5);
        assert_eq!(router.route(&event_at(0)), 0);
        assert_eq!(router.route(&event_at(7)), 2);
        assert_eq!(router.route(&event_at(1_700_000_004)), 4);
    }

    #[test]
    fn test_route_ignores_sub_second_precision() {
        let router = ShardRouter::new(5);
        let base = Utc.timestamp_opt(12, 0).unwrap();
        let later = Utc.timestamp_opt(12, 999_000_000).unwrap();
        assert_eq!(router.shard_for(base), router.shard_for(later));
    }

    #[test]
    fn test_route_is_deterministic() {
        let router = ShardRouter::new(5);
        let event = event_at(1_234_567);
        let first = router.route(&event);
        for _ in 0..10 {
            assert_eq!(router.route(&event), first);
        }
    }

    #[test]
    fn test_route_pre_epoch_stays_in_range() {
        let router = ShardRouter::new(5);
        assert_eq!(router.route(&event_at(-1)), 4);
        assert_eq!(router.route(&event_at(-5)), 0);
    }

    #[test]
    fn test_zero_shards_clamped() {
        let router = ShardRouter::new(0);
        assert_eq!(router.shard_count(), 1);
        assert_eq!(router.route(&event_at(42)), 0);
    }

    #[test]
    fn test_assign_per_event_spreads() {
        let router = ShardRouter::new(5);
        let events = (0..5).map(event_at).collect();
        let shards: Vec<ShardId> = router
            .assign(events, RoutingMode::PerEvent)
            .into_iter()
            .map(|(s, _)| s)
            .collect();
        assert_eq!(shards, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_assign_single_shard_uses_clock() {
        let router = ShardRouter::new(5);
        let now = Utc.timestamp_opt(13, 0).unwrap();
        let events = (0..5).map(event_at).collect();

        let assigned = router.assign_at(events, RoutingMode::SingleShard, now);
        assert_eq!(assigned.len(), 5);
        assert!(assigned.iter().all(|(s, _)| *s == 3));
        // Order within the request is kept
        let secs: Vec<i64> = assigned.iter().map(|(_, e)| e.timestamp.timestamp()).collect();
        assert_eq!(secs, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_routing_mode_from_flag() {
        assert_eq!(RoutingMode::from_flag(true), RoutingMode::SingleShard);
        assert_eq!(RoutingMode::from_flag(false), RoutingMode::PerEvent);
        assert_eq!(RoutingMode::default(), RoutingMode::PerEvent);
    }
}
