//! Upload admission pipeline.
//!
//! Phases run in a fixed order: parse the multipart body, verify the
//! challenge token, charge the rate limiter, then process each file
//! independently. Request-level failures (bad method, failed challenge, rate
//! limit, malformed body) reject the whole request; everything after that is
//! per-file, and the response is HTTP 200 with a mixed result list.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use pixbin_core::mime::extension_for;
use pixbin_core::{AppError, ErrorMetadata, UploadResult, UploadResponse};
use pixbin_storage::keys::{generate_key, object_key};

use crate::error::{app_error_from_storage, ErrorResponse, HttpAppError};
use crate::limits::CounterDecision;
use crate::services::Verification;
use crate::state::AppState;
use crate::utils::ClientIp;

/// Form field names accepted for file parts.
const FILE_FIELD_NAMES: &[&str] = &["files[]", "file"];
/// Form field names accepted for the challenge token.
const TOKEN_FIELD_NAMES: &[&str] = &["cf-turnstile-response", "token"];

/// Collision retries before giving up on key allocation.
const MAX_KEY_ATTEMPTS: usize = 5;
/// Hard cap on files per request, independent of the body size limit.
const MAX_FILES_PER_REQUEST: usize = 10;

struct FilePart {
    filename: String,
    content_type: String,
    data: Bytes,
}

struct ParsedForm {
    files: Vec<FilePart>,
    token: Option<String>,
}

/// Upload one or more image files.
///
/// Accepts multipart form data with files under `files[]` (or `file`) and an
/// optional challenge token. Individual file failures do not fail the
/// request; each file reports its own status in the response.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "upload",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Per-file results, including partial failures", body = UploadResponse),
        (status = 400, description = "Malformed request or no files supplied", body = ErrorResponse),
        (status = 403, description = "Challenge verification failed or unavailable", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 500, description = "Storage failure affecting the whole request", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(client_ip = %client_ip.0, operation = "upload"))]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    client_ip: ClientIp,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let started = Instant::now();
    let ClientIp(client_ip) = client_ip;

    // Phase 1: drain the body before any admission decision, so the token can
    // appear after the files in the form.
    let form = parse_form(multipart).await?;

    // Phase 2: challenge verification, fail-closed.
    if let Some(captcha) = &state.captcha {
        match captcha.verify(form.token.as_deref(), &client_ip).await {
            Verification::Verified => {}
            Verification::Rejected => return Err(AppError::VerificationFailed.into()),
            Verification::Unavailable => return Err(AppError::VerificationUnavailable.into()),
        }
    }

    // Phase 3: one rate-limit charge per request, regardless of file count.
    match state.rate_limiter.check_and_increment(&client_ip).await {
        CounterDecision::Allowed { remaining } => {
            tracing::debug!(remaining, "Upload attempt admitted");
        }
        CounterDecision::Limited { retry_after } => {
            return Err(AppError::RateLimited {
                retry_after_secs: retry_after.as_secs(),
            }
            .into());
        }
    }

    if form.files.is_empty() {
        return Err(AppError::InvalidInput("No files in request".to_string()).into());
    }
    if form.files.len() > MAX_FILES_PER_REQUEST {
        return Err(AppError::InvalidInput(format!(
            "Too many files: {} (max {})",
            form.files.len(),
            MAX_FILES_PER_REQUEST
        ))
        .into());
    }

    // Phase 4: per-file processing. Files are independent; one failure never
    // rolls back another file's stored object.
    let file_count = form.files.len();
    let mut results = Vec::with_capacity(file_count);
    let mut storage_failures = 0usize;

    for part in form.files {
        let filename = part.filename.clone();
        match process_file(&state, part).await {
            Ok(key) => {
                results.push(UploadResult::success(filename, key));
            }
            Err(err) => {
                if matches!(err, AppError::Storage(_) | AppError::KeySpaceExhausted) {
                    storage_failures += 1;
                }
                if state.config.strict_uploads {
                    return Err(err.into());
                }
                results.push(UploadResult::error(
                    filename,
                    err.client_message(),
                    err.error_code(),
                ));
            }
        }
    }

    // A batch where every file died on storage points at the backend, not at
    // the files; surface that as a request-level failure.
    if file_count > 1 && storage_failures == file_count {
        return Err(AppError::Storage("all files in batch failed to store".to_string()).into());
    }

    let stored = results
        .iter()
        .filter(|r| r.status == pixbin_core::FileStatus::Success)
        .count();
    tracing::info!(
        files = file_count,
        stored,
        failed = file_count - stored,
        duration_ms = started.elapsed().as_millis() as u64,
        "Upload request completed"
    );

    Ok(Json(UploadResponse { files: results }))
}

/// Drain the multipart stream into file parts and an optional token.
///
/// Unknown fields are skipped rather than rejected so clients can send extra
/// form metadata without breaking.
async fn parse_form(mut multipart: Multipart) -> Result<ParsedForm, HttpAppError> {
    let mut files = Vec::new();
    let mut token = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        if TOKEN_FIELD_NAMES.contains(&name.as_str()) {
            token = Some(field.text().await?);
            continue;
        }

        if FILE_FIELD_NAMES.contains(&name.as_str()) {
            let filename = field
                .file_name()
                .map(|f| f.to_string())
                .unwrap_or_else(|| "unnamed".to_string());
            let content_type = field
                .content_type()
                .map(|ct| ct.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let data = field.bytes().await?;
            files.push(FilePart {
                filename,
                content_type,
                data,
            });
            continue;
        }

        tracing::debug!(field = %name, "Skipping unrecognized form field");
    }

    Ok(ParsedForm { files, token })
}

/// Validate, allocate a key, and store a single file.
async fn process_file(state: &AppState, part: FilePart) -> Result<String, AppError> {
    state
        .validator
        .validate(part.data.len(), &part.content_type)?;

    // Declared type is trusted; the canonical extension comes from the map,
    // so `image/jpeg` always stores as `.jpg`.
    let extension = extension_for(&part.content_type).unwrap_or("bin");

    let key = allocate_key(state, extension).await?;

    if let Err(err) = state
        .storage
        .put(&key, &part.content_type, part.data.clone())
        .await
    {
        return Err(app_error_from_storage(err));
    }

    tracing::info!(
        key = %key,
        size_bytes = part.data.len(),
        content_type = %part.content_type,
        "Object stored"
    );

    Ok(key)
}

/// Generate a candidate key and collision-check it, retrying a bounded number
/// of times. The exists-then-put window is accepted; see the storage crate
/// docs for the key format contract.
async fn allocate_key(state: &AppState, extension: &str) -> Result<String, AppError> {
    for attempt in 0..MAX_KEY_ATTEMPTS {
        let id = generate_key(state.config.object_key_length);
        let key = object_key(&id, extension);

        match state.storage.exists(&key).await {
            Ok(false) => return Ok(key),
            Ok(true) => {
                tracing::warn!(key = %key, attempt, "Key collision, regenerating");
            }
            Err(err) => return Err(app_error_from_storage(err)),
        }
    }

    tracing::error!(
        attempts = MAX_KEY_ATTEMPTS,
        key_length = state.config.object_key_length,
        "Key space exhausted, raise OBJECT_KEY_LENGTH"
    );
    Err(AppError::KeySpaceExhausted)
}
