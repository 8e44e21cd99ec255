//! HTTP error response conversion
//!
//! This module provides HTTP-specific error response conversion for AppError.
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>`. Use
//! `AppError` (or types that implement `Into<AppError>`) for errors and `?` so they
//! become `HttpAppError` and render consistently (status, body, logging).

use axum::{
    extract::multipart::MultipartError,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pixbin_core::{AppError, ErrorMetadata, LogLevel, ValidationError};
use pixbin_storage::StorageError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client (e.g., "Wait 60s and retry")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from pixbin-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

/// Multipart parse failures are client errors, not server faults.
impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "malformed multipart body: {}",
            err.body_text()
        )))
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        HttpAppError(AppError::from(err))
    }
}

/// Map storage failures to domain errors. Used both for request-level
/// responses (retrieval) and for per-file outcomes in the upload pipeline.
pub fn app_error_from_storage(err: StorageError) -> AppError {
    match err {
        StorageError::NotFound(key) => AppError::NotFound(key),
        StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
        other => AppError::Storage(other.to_string()),
    }
}

// Convert domain errors to HttpAppError (avoids orphan rule: we impl for local HttpAppError)
impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(app_error_from_storage(err))
    }
}

fn log_error(error: &AppError) {
    let error_code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error.detailed_message(), code = error_code, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error.detailed_message(), code = error_code, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error.detailed_message(), code = error_code, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Always hide details in production for security; in non-production, only show details for non-sensitive errors.
        let details = if is_production_env() || app_error.is_sensitive() {
            None
        } else {
            Some(app_error.detailed_message())
        };

        let body = Json(ErrorResponse {
            error: app_error.client_message(),
            details,
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        });

        let mut response = (status, body).into_response();

        // 429 responses communicate retry-after semantics.
        if let AppError::RateLimited { retry_after_secs } = app_error {
            let retry_after = (*retry_after_secs).max(1);
            if let Ok(header_value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("Retry-After", header_value);
            }
            response
                .headers_mut()
                .insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_storage_error_not_found() {
        let storage_err = StorageError::NotFound("a1b2c3d4.png".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::NotFound(key) => assert_eq!(key, "a1b2c3d4.png"),
            _ => panic!("Expected NotFound variant"),
        }
    }

    #[test]
    fn test_from_storage_error_put_failed() {
        let storage_err = StorageError::PutFailed("disk full".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::Storage(msg) => assert!(msg.contains("disk full")),
            _ => panic!("Expected Storage variant"),
        }
    }

    #[test]
    fn test_from_storage_error_invalid_key() {
        let storage_err = StorageError::InvalidKey("bad key".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::InvalidInput(msg) => assert_eq!(msg, "bad key"),
            _ => panic!("Expected InvalidInput variant"),
        }
    }

    #[test]
    fn test_from_validation_error_file_too_large() {
        let validation_err = ValidationError::FileTooLarge {
            size: 1000,
            max: 500,
        };
        let HttpAppError(app_err) = validation_err.into();
        match app_err {
            AppError::PayloadTooLarge(msg) => {
                assert!(msg.contains("1000"));
                assert!(msg.contains("500"));
            }
            _ => panic!("Expected PayloadTooLarge variant"),
        }
    }

    #[test]
    fn test_from_validation_error_unsupported_type() {
        let validation_err = ValidationError::UnsupportedContentType {
            content_type: "application/pdf".to_string(),
            allowed: vec!["image/png".to_string()],
        };
        let HttpAppError(app_err) = validation_err.into();
        match app_err {
            AppError::UnsupportedMediaType(msg) => {
                assert!(msg.contains("application/pdf"));
                assert!(msg.contains("image/png"));
            }
            _ => panic!("Expected UnsupportedMediaType variant"),
        }
    }

    /// Verifies the public error response contract: serialized ErrorResponse has "error",
    /// "code", "recoverable", and optionally "details" / "suggested_action".
    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse {
            error: "Not found".to_string(),
            details: None,
            code: "NOT_FOUND".to_string(),
            recoverable: false,
            suggested_action: None,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json.get("error").and_then(|v| v.as_str()).is_some());
        assert_eq!(json.get("code").and_then(|v| v.as_str()), Some("NOT_FOUND"));
        assert!(json.get("recoverable").and_then(|v| v.as_bool()).is_some());
        assert!(json.get("details").is_none());
    }
}
