// OpenAPI specification generation

use crate::api;
use crate::api::{ErrorResponse, ListResponse};
use shardpool_core::{Event, WorkerRecord};
use utoipa::OpenApi;

/// OpenAPI documentation for the Shardpool API
#[derive(OpenApi)]
#[openapi(
    paths(
        api::events::ingest_events,
        api::workers::list_workers,
        api::workers::get_worker,
        api::health::health,
    ),
    components(
        schemas(
            Event,
            WorkerRecord,
            ListResponse<WorkerRecord>,
            ErrorResponse,
            api::events::IngestResponse,
            api::health::HealthResponse,
        )
    ),
    tags(
        (name = "events", description = "Event ingestion endpoints"),
        (name = "workers", description = "Worker inspection endpoints"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "Shardpool API",
        version = "0.1.0",
        description = "Ingest timestamped events into a sharded, batching worker pool",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;
