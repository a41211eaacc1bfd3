// Shardpool API library
// Decision: Router assembly lives here so the binary and tests build the same app

pub mod api;
pub mod config;
pub mod openapi;
pub mod shutdown;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use api::AppState;
pub use config::ServerConfig;

/// Build the full application router
pub fn create_app(state: AppState, api_prefix: &str, cors_origins: &[HeaderValue]) -> Router {
    let app = Router::new()
        .merge(api::health::routes(state.clone()))
        .merge(build_router_with_prefix(api::api_routes(state), api_prefix))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", openapi::ApiDoc::openapi()),
        );

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins.iter().cloned()))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]),
        )
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http())
}

/// Nest routes under the prefix when one is set
fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}
