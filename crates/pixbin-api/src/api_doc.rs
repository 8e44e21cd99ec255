//! OpenAPI documentation.

use axum::Json;
use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers;
use pixbin_core::models::{
    CounterResponse, FileStatus, HealthResponse, UploadResponse, UploadResult,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pixbin API",
        version = "0.1.0",
        description = "Anonymous image hosting: multipart uploads with bot verification and rate limiting, short shareable keys, immutable retrieval."
    ),
    paths(
        handlers::upload::upload,
        handlers::object_get::get_object,
        handlers::counter::counter,
        handlers::health::health,
    ),
    components(schemas(
        UploadResponse,
        UploadResult,
        FileStatus,
        CounterResponse,
        HealthResponse,
        ErrorResponse,
    )),
    tags(
        (name = "upload", description = "Upload admission pipeline"),
        (name = "images", description = "Stored object retrieval"),
        (name = "counter", description = "Visit counter"),
        (name = "health", description = "Probes")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document as JSON.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
