//! Persistence port for the worker pool
//!
//! This module provides:
//! - [`EventStore`] trait the workers write through
//! - [`InMemoryEventStore`] for testing and dev mode
//!
//! The Postgres implementation lives in `shardpool-storage`.

mod memory;
mod store;

pub use memory::InMemoryEventStore;
pub use store::{EventStore, StoreError};
