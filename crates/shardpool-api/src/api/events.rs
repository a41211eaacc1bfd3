// Event ingestion route

use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shardpool_core::{Event, RoutingMode};
use utoipa::{IntoParams, ToSchema};

use super::common::{pool_error, ApiError, ErrorResponse};
use super::AppState;

/// Query parameters for event ingestion
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct IngestParams {
    /// "true" routes the whole request to one shard
    pub single_shard: Option<String>,
}

impl IngestParams {
    pub fn routing_mode(&self) -> RoutingMode {
        RoutingMode::from_flag(self.single_shard.as_deref() == Some("true"))
    }
}

/// Result of an accepted ingestion request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    /// Number of events enqueued
    pub accepted: usize,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/events", post(ingest_events))
        .with_state(state)
}

/// POST /events - Enqueue a batch of events
#[utoipa::path(
    post,
    path = "/events",
    params(IngestParams),
    request_body = Vec<Event>,
    responses(
        (status = 200, description = "Events accepted", body = IngestResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 503, description = "Pool is shutting down", body = ErrorResponse)
    ),
    tag = "events"
)]
pub async fn ingest_events(
    State(state): State<AppState>,
    Query(params): Query<IngestParams>,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    let events: Vec<Event> = serde_json::from_slice(&body)
        .map_err(|e| ErrorResponse::bad_request(format!("failed to decode events: {}", e)))?;

    let accepted = state
        .pool
        .send(events, params.routing_mode())
        .await
        .map_err(pool_error)?;

    Ok(Json(IngestResponse { accepted }))
}
