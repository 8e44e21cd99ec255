//! Storage backend factory.

use std::sync::Arc;

use crate::traits::{Storage, StorageError, StorageResult};
use pixbin_core::{Config, StorageBackend};

/// Build the configured storage backend.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let storage = crate::local::LocalStorage::new(&config.local_storage_path).await?;
            tracing::info!(
                path = %config.local_storage_path,
                "Using local filesystem storage"
            );
            Ok(Arc::new(storage))
        }
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET is required".to_string()))?;
            let region = config
                .s3_region
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_REGION is required".to_string()))?;
            let storage =
                crate::s3::S3Storage::new(bucket.clone(), region, config.s3_endpoint.clone())?;
            tracing::info!(bucket = %bucket, "Using S3 storage");
            Ok(Arc::new(storage))
        }
        #[allow(unreachable_patterns)]
        other => Err(StorageError::ConfigError(format!(
            "Storage backend {} is not enabled in this build",
            other
        ))),
    }
}
