//! Muralis Storage Library
//!
//! This crate provides the `AssetStore` abstraction the pipeline uploads
//! through, plus implementations for S3 and the local filesystem.
//!
//! # Object layout
//!
//! An object is addressed by bucket, path and name (`ObjectLocation`). The
//! storage key inside the bucket is `{path}{name}`, where `path` always ends
//! with `/`. Keys must not contain `..` or start with `/`. Key composition and
//! object naming live in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{generate_relative_path, ObjectLocation};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use muralis_core::{StorageBackend, StoreMode};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{AssetStore, StorageError, StorageResult};
