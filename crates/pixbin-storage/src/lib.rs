//! Pixbin Storage Library
//!
//! Object store gateway for the upload pipeline: the `Storage` trait plus
//! local-filesystem and S3-compatible implementations.
//!
//! # Key format
//!
//! Keys are flat, short, URL-safe strings with an embedded extension, e.g.
//! `a1b2c3d4.png`. They are generated by the `keys` module from a
//! cryptographically adequate random source; callers must check `exists`
//! before `put` and retry on collision. Objects are immutable once written;
//! there is no update path.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::generate_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use pixbin_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StoredObject};
