//! Route wiring and HTTP middleware layers.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api_doc::openapi_json;
use crate::handlers;
use crate::state::AppState;

/// Setup all application routes
///
/// Method mismatches yield 405 from axum's router; CORS preflight is handled
/// by the layer, so OPTIONS never reaches the handlers.
pub fn setup_routes(state: Arc<AppState>) -> Router {
    let cors = setup_cors(&state);

    // The body limit leaves room for a few max-size files plus framing, so a
    // single oversized file surfaces as a per-file error instead of a
    // transport-level rejection.
    let body_limit = state.config.multipart_body_limit();

    Router::new()
        .route("/upload", post(handlers::upload::upload))
        .route("/i/{key}", get(handlers::object_get::get_object))
        .route("/counter", get(handlers::counter::counter))
        .route("/health", get(handlers::health::health))
        .route("/api/openapi.json", get(openapi_json))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Setup CORS configuration
fn setup_cors(state: &Arc<AppState>) -> CorsLayer {
    let origins = &state.config.cors_origins;

    if origins.contains(&"*".to_string()) {
        if state.config.is_production() {
            tracing::warn!("CORS configured to allow all origins in production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    }
}
