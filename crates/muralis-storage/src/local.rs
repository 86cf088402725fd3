use crate::keys::ObjectLocation;
use crate::traits::{AssetStore, StorageError, StorageResult};
use crate::{StorageBackend, StoreMode};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Each bucket is a sub-directory of `base_path`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    public_base_url: Option<String>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/muralis/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            public_base_url: None,
        })
    }

    /// Serve public objects from a CDN base instead of `base_url`.
    pub fn with_public_base_url(mut self, public_base_url: Option<String>) -> Self {
        self.public_base_url = public_base_url;
        self
    }

    /// Convert an object location to a filesystem path with security validation
    ///
    /// Rejects locations whose key could escape the base storage directory.
    fn location_to_path(&self, location: &ObjectLocation) -> StorageResult<PathBuf> {
        location.validate()?;

        let path = self.base_path.join(&location.bucket).join(location.key());

        if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AssetStore for LocalStorage {
    async fn store(
        &self,
        file: &Path,
        location: &ObjectLocation,
        mode: StoreMode,
    ) -> StorageResult<()> {
        let path = self.location_to_path(location)?;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut source = fs::File::open(file).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to open source {}: {}", file.display(), e))
        })?;

        let mut target = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let size = tokio::io::copy(&mut source, &mut target).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        target.flush().await?;
        target.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %location.bucket,
            key = %location.key(),
            mode = %mode,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage store successful"
        );

        Ok(())
    }

    fn gen_url(&self, location: &ObjectLocation, auth_required: bool) -> String {
        match (&self.public_base_url, auth_required) {
            (Some(public), false) => {
                format!("{}/{}", public.trim_end_matches('/'), location.key())
            }
            _ => format!(
                "{}/{}/{}",
                self.base_url.trim_end_matches('/'),
                location.bucket,
                location.key()
            ),
        }
    }

    async fn exists(&self, location: &ObjectLocation) -> StorageResult<bool> {
        let path = self.location_to_path(location)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
