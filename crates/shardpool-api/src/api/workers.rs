// Worker lookup routes

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use shardpool_core::WorkerRecord;
use uuid::Uuid;

use super::common::{store_error, ApiError, ErrorResponse, ListResponse};
use super::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/workers", get(list_workers))
        .route("/workers/{id}", get(get_worker))
        .with_state(state)
}

/// GET /workers - List every worker that has run, finished or not
#[utoipa::path(
    get,
    path = "/workers",
    responses(
        (status = 200, description = "List of workers", body = ListResponse<WorkerRecord>),
        (status = 400, description = "Storage error", body = ErrorResponse)
    ),
    tag = "workers"
)]
pub async fn list_workers(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<WorkerRecord>>, ApiError> {
    let workers = state
        .store
        .list_workers()
        .await
        .map_err(|e| store_error("Failed to list workers", e))?;

    Ok(Json(ListResponse::new(workers)))
}

/// GET /workers/{id} - Get a worker by ID
#[utoipa::path(
    get,
    path = "/workers/{id}",
    params(
        ("id" = String, Path, description = "Worker ID (UUID)")
    ),
    responses(
        (status = 200, description = "Worker found", body = WorkerRecord),
        (status = 400, description = "Invalid worker ID or storage error", body = ErrorResponse),
        (status = 404, description = "Worker not found", body = ErrorResponse)
    ),
    tag = "workers"
)]
pub async fn get_worker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkerRecord>, ApiError> {
    let worker_id = Uuid::parse_str(&id)
        .map_err(|e| ErrorResponse::bad_request(format!("invalid worker id: {}", e)))?;

    let worker = state
        .store
        .get_worker(worker_id)
        .await
        .map_err(|e| store_error("Failed to get worker", e))?
        .ok_or_else(|| ErrorResponse::not_found(format!("worker {} not found", worker_id)))?;

    Ok(Json(worker))
}
