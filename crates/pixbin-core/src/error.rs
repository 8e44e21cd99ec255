//! Error types module
//!
//! All request-level and per-file failures are unified under the `AppError`
//! enum. Each variant self-describes its HTTP presentation through the
//! `ErrorMetadata` trait so the api crate can render consistent responses
//! without matching on variants at every call site.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like resource limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "FILE_TOO_LARGE")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Verification failed")]
    VerificationFailed,

    #[error("Verification unavailable")]
    VerificationUnavailable,

    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Key space exhausted after collision retries")]
    KeySpaceExhausted,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<crate::validation::ValidationError> for AppError {
    fn from(err: crate::validation::ValidationError) -> Self {
        use crate::validation::ValidationError;
        match err {
            ValidationError::EmptyFile => AppError::InvalidInput("File is empty".to_string()),
            ValidationError::FileTooLarge { size, max } => AppError::PayloadTooLarge(format!(
                "{} bytes exceeds max {} bytes",
                size, max
            )),
            ValidationError::UnsupportedContentType {
                content_type,
                allowed,
            } => AppError::UnsupportedMediaType(format!(
                "'{}' is not allowed (allowed: {})",
                content_type,
                allowed.join(", ")
            )),
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// Reduces duplication in the ErrorMetadata impl; client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, None, false, LogLevel::Debug),
        AppError::PayloadTooLarge(_) => (
            413,
            "FILE_TOO_LARGE",
            false,
            Some("Upload a smaller file"),
            false,
            LogLevel::Debug,
        ),
        AppError::UnsupportedMediaType(_) => (
            415,
            "UNSUPPORTED_TYPE",
            false,
            Some("Upload one of the allowed image types"),
            false,
            LogLevel::Debug,
        ),
        AppError::VerificationFailed => (
            403,
            "VERIFICATION_FAILED",
            false,
            Some("Complete the challenge again and resubmit"),
            false,
            LogLevel::Debug,
        ),
        AppError::VerificationUnavailable => (
            403,
            "VERIFICATION_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            false,
            LogLevel::Warn,
        ),
        AppError::RateLimited { .. } => (
            429,
            "RATE_LIMITED",
            true,
            Some("Wait for the window to reset and retry"),
            false,
            LogLevel::Warn,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::KeySpaceExhausted => (
            500,
            "KEY_SPACE_EXHAUSTED",
            true,
            Some("Retry the upload"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            false,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => format!("Invalid input: {}", msg),
            AppError::NotFound(what) => format!("Not found: {}", what),
            AppError::PayloadTooLarge(msg) => format!("File too large: {}", msg),
            AppError::UnsupportedMediaType(msg) => format!("Unsupported media type: {}", msg),
            AppError::VerificationFailed => "Human verification failed".to_string(),
            AppError::VerificationUnavailable => {
                "Human verification is temporarily unavailable".to_string()
            }
            AppError::RateLimited { .. } => "Too many requests. Please slow down.".to_string(),
            AppError::Storage(_) => "Storage operation failed".to_string(),
            AppError::KeySpaceExhausted => {
                "Could not allocate a storage key, please retry".to_string()
            }
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
        }
    }
}

impl AppError {
    /// Internal message with full detail, for logs and non-production responses.
    pub fn detailed_message(&self) -> String {
        match self {
            AppError::InternalWithSource { message, source } => {
                format!("{}: {}", message, source)
            }
            other => other.to_string(),
        }
    }
}
