//! Object retrieval handler.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Retrieve a stored image by key.
///
/// Objects are immutable, so responses carry a long-lived public cache
/// header and CDNs can cache them indefinitely.
#[utoipa::path(
    get,
    path = "/i/{key}",
    tag = "images",
    params(
        ("key" = String, Path, description = "Object key, e.g. a1b2c3d4.png")
    ),
    responses(
        (status = 200, description = "Image bytes with original content type"),
        (status = 400, description = "Malformed key", body = ErrorResponse),
        (status = 404, description = "No object under this key", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(key = %key, operation = "get_object"))]
pub async fn get_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, HttpAppError> {
    let object = state.storage.get(&key).await?;

    tracing::debug!(size_bytes = object.data.len(), "Object served");

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, object.content_type)
        .header(header::CACHE_CONTROL, "public, max-age=31536000")
        .body(Body::from(object.data))
        .map_err(|e| anyhow::Error::from(e))?;

    Ok(response)
}
