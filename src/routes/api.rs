use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::path::Path;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::docs::ApiDoc;
use crate::handlers::{api_root, diagnostics, health_check, ready_check, send_invitation};
use crate::routes::auth_middleware::auth_middleware;
use crate::websocket::websocket_handler;
use crate::AppState;

/// Create API routes
pub fn create_api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/v1/diagnostics", get(diagnostics))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/sendmail", post(send_invitation))
        .merge(protected)
}

/// Assemble the full application: real-time channel, API, docs, the built
/// client when `static_dir` is configured, and middleware
pub fn create_router(state: AppState, config: &Config) -> Router {
    let mut router = Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/", get(api_root))
        .nest("/api", create_api_routes(state.clone()))
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()));

    if let Some(dir) = config.static_dir.as_deref() {
        info!("Serving client build from {}", dir);
        router = router.fallback_service(static_client(dir));
    }

    router
        .layer(cors_layer(config.allowed_origins()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Unknown paths get index.html so the client can route them itself
fn static_client(dir: &str) -> ServeDir<ServeFile> {
    ServeDir::new(dir).fallback(ServeFile::new(Path::new(dir).join("index.html")))
}

fn cors_layer(allowed_origins: Option<Vec<String>>) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allowed_origins {
        None => base.allow_origin(Any),
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin {}", o);
                        None
                    }
                })
                .collect();
            base.allow_origin(AllowOrigin::list(origins))
        }
    }
}
