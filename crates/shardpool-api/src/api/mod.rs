// HTTP API routes
//
// Health is served at the root; events and workers honour API_PREFIX.

pub mod common;
pub mod events;
pub mod health;
pub mod workers;

use std::sync::Arc;

use axum::Router;
use shardpool_core::{EventStore, ShardPool};

pub use common::{ErrorResponse, ListResponse};

/// State shared by all routes
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<ShardPool>,
    pub store: Arc<dyn EventStore>,
    /// Storage backend name reported by /health
    pub storage: &'static str,
}

impl AppState {
    pub fn new(pool: Arc<ShardPool>, store: Arc<dyn EventStore>, storage: &'static str) -> Self {
        Self {
            pool,
            store,
            storage,
        }
    }
}

/// Routes subject to API_PREFIX
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .merge(events::routes(state.clone()))
        .merge(workers::routes(state))
}
