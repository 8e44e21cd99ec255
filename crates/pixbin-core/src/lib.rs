//! Pixbin Core Library
//!
//! Shared building blocks for the pixbin services: configuration, the unified
//! `AppError` type, response models, the MIME/extension table, and upload
//! validation. No I/O happens in this crate.

pub mod config;
pub mod error;
pub mod mime;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{CounterResponse, FileStatus, HealthResponse, UploadResponse, UploadResult};
pub use storage_types::StorageBackend;
pub use validation::{UploadValidator, ValidationError};
