//! Storage abstraction trait
//!
//! This module defines the Storage trait that all object store backends must
//! implement. The upload orchestrator only talks to this trait, so backends
//! can be swapped without touching the pipeline.

use async_trait::async_trait;
use bytes::Bytes;
use pixbin_core::StorageBackend;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Put failed: {0}")]
    PutFailed(String),

    #[error("Get failed: {0}")]
    GetFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A stored object as returned by `Storage::get`.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub data: Bytes,
}

/// Storage abstraction trait
///
/// Writes are all-or-nothing from the caller's perspective: a failed `put`
/// never leaves a partially readable object. `put` does not guard against
/// overwrites by itself; callers check `exists` first and pick a new key on
/// collision (see the crate root documentation).
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write an object under `key` with its content type recorded.
    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> StorageResult<()>;

    /// Read an object and its recorded content type.
    async fn get(&self, key: &str) -> StorageResult<StoredObject>;

    /// Check if an object exists under `key`.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Validate a flat object key before it touches a backend.
///
/// Keys are generated internally, but retrieval accepts them from the URL
/// path, so traversal sequences and separators are rejected here once for
/// every backend.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.len() > 64 {
        return Err(StorageError::InvalidKey(
            "Storage key has invalid length".to_string(),
        ));
    }
    if key.contains("..") || key.contains('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_generated_form() {
        assert!(validate_key("a1b2c3d4.png").is_ok());
        assert!(validate_key("zzzzzz.webp").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(matches!(
            validate_key("../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_key("a/b.png"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            validate_key(""),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
