// Response envelopes and error mapping shared by the routes
//
// Pool and storage errors become (StatusCode, Json<ErrorResponse>) here so the
// handlers only decide which failure they hit.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use shardpool_core::{PoolError, StoreError};
use utoipa::ToSchema;

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// What went wrong.
    pub error: String,
}

/// Handler error: status plus JSON body
pub type ApiError = (StatusCode, Json<ErrorResponse>);

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    pub fn with_status(self, status: StatusCode) -> ApiError {
        (status, Json(self))
    }

    pub fn bad_request(error: impl Into<String>) -> ApiError {
        Self::new(error).with_status(StatusCode::BAD_REQUEST)
    }

    pub fn not_found(error: impl Into<String>) -> ApiError {
        Self::new(error).with_status(StatusCode::NOT_FOUND)
    }
}

/// Ingestion refusals are 503 once the pool has stopped accepting events
pub fn pool_error(e: PoolError) -> ApiError {
    match e {
        PoolError::ShutDown | PoolError::QueueClosed(_) => {
            ErrorResponse::new(e.to_string()).with_status(StatusCode::SERVICE_UNAVAILABLE)
        }
        other => {
            tracing::error!("Failed to enqueue events: {}", other);
            ErrorResponse::new(other.to_string()).with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Storage failures on reads are reported as 400
pub fn store_error(context: &str, e: StoreError) -> ApiError {
    tracing::error!("{}: {}", context, e);
    ErrorResponse::bad_request(e.to_string())
}

/// List envelope: `{"data": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    /// Items in storage order.
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }
}
