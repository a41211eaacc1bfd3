// Postgres storage layer with sqlx
//
// This crate provides the database implementation of the core EventStore trait:
// - DbEventStore: worker records and flushed event batches

pub mod event_store;
pub mod models;
pub mod repositories;

pub use event_store::DbEventStore;
pub use models::*;
pub use repositories::*;
