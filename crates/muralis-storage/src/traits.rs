//! Storage abstraction trait
//!
//! This module defines the `AssetStore` trait that all storage backends must implement.

use crate::keys::ObjectLocation;
use crate::{StorageBackend, StoreMode};
use async_trait::async_trait;
use muralis_core::AppError;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConfigError(msg) => AppError::Config(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Durable remote storage for derived assets.
///
/// `store` either confirms the object is persisted or returns an error; it
/// never fails silently. `gen_url` is a pure function of its inputs and may be
/// called before or after `store`. Implementations bound every remote call by
/// their own client timeout; callers do not retry.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist the file at `file` under `location`.
    ///
    /// `mode` is an advisory [`StoreMode`] hint. Backends may ignore it.
    async fn store(
        &self,
        file: &Path,
        location: &ObjectLocation,
        mode: StoreMode,
    ) -> StorageResult<()>;

    /// URL under which `location` is (or will be) reachable.
    fn gen_url(&self, location: &ObjectLocation, auth_required: bool) -> String;

    /// Check if an object exists
    async fn exists(&self, location: &ObjectLocation) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
