//! Response models shared between handlers and tests.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-file outcome status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Error,
}

/// Per-file upload outcome. A failed file carries an error reason and code;
/// a stored file carries the public key under `url`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResult {
    pub status: FileStatus,
    /// Advisory original filename as supplied by the client.
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl UploadResult {
    pub fn success(file: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            status: FileStatus::Success,
            file: file.into(),
            url: Some(key.into()),
            error: None,
            code: None,
        }
    }

    pub fn error(
        file: impl Into<String>,
        reason: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            status: FileStatus::Error,
            file: file.into(),
            url: None,
            error: Some(reason.into()),
            code: Some(code.into()),
        }
    }
}

/// Aggregated upload response, returned with HTTP 200 even when individual
/// files failed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub files: Vec<UploadResult>,
}

/// Visit counter response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CounterResponse {
    pub total: u64,
    pub unique: u64,
}

/// Liveness probe response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}
