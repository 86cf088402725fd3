use crate::keys::ObjectLocation;
use crate::traits::{AssetStore, StorageError, StorageResult};
use crate::{StorageBackend, StoreMode};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};
use std::collections::HashMap;
use std::path::Path;

/// S3 storage implementation
///
/// Holds one client per configured bucket; storing into any other bucket is
/// an error rather than an implicit client creation.
#[derive(Clone)]
pub struct S3Storage {
    stores: HashMap<String, AmazonS3>,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    public_base_url: Option<String>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `buckets` - Every bucket the pipeline writes to
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        buckets: &[String],
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        if buckets.is_empty() {
            return Err(StorageError::ConfigError(
                "At least one bucket must be configured".to_string(),
            ));
        }

        let mut stores = HashMap::with_capacity(buckets.len());
        for bucket in buckets {
            // Build AmazonS3 object store from environment and explicit settings.
            let mut builder = AmazonS3Builder::from_env()
                .with_region(region.clone())
                .with_bucket_name(bucket.clone());

            if let Some(ref endpoint) = endpoint_url {
                let allow_http = endpoint.starts_with("http://");
                builder = builder
                    .with_endpoint(endpoint.clone())
                    .with_allow_http(allow_http);
            }

            let store = builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;
            stores.insert(bucket.clone(), store);
        }

        Ok(S3Storage {
            stores,
            region,
            endpoint_url,
            public_base_url: None,
        })
    }

    /// Serve public objects from a CDN base instead of the bucket URL.
    pub fn with_public_base_url(mut self, public_base_url: Option<String>) -> Self {
        self.public_base_url = public_base_url;
        self
    }

    fn client(&self, bucket: &str) -> StorageResult<&AmazonS3> {
        self.stores
            .get(bucket)
            .ok_or_else(|| StorageError::UnknownBucket(bucket.to_string()))
    }

    /// Generate the bucket URL for an object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style: {endpoint}/{bucket}/{key}
    fn bucket_url(&self, location: &ObjectLocation) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, location.bucket, location.key())
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                location.bucket,
                self.region,
                location.key()
            )
        }
    }
}

#[async_trait]
impl AssetStore for S3Storage {
    async fn store(
        &self,
        file: &Path,
        location: &ObjectLocation,
        mode: StoreMode,
    ) -> StorageResult<()> {
        location.validate()?;
        let store = self.client(&location.bucket)?;

        let data = tokio::fs::read(file).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read source {}: {}", file.display(), e))
        })?;
        let size = data.len() as u64;
        let key = location.key();
        let object_path = ObjectPath::from(key.clone());

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store
            .put(&object_path, PutPayload::from(Bytes::from(data)))
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %location.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 store failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %location.bucket,
            key = %key,
            mode = %mode,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 store successful"
        );

        Ok(())
    }

    fn gen_url(&self, location: &ObjectLocation, auth_required: bool) -> String {
        match (&self.public_base_url, auth_required) {
            (Some(public), false) => {
                format!("{}/{}", public.trim_end_matches('/'), location.key())
            }
            _ => self.bucket_url(location),
        }
    }

    async fn exists(&self, location: &ObjectLocation) -> StorageResult<bool> {
        location.validate()?;
        let store = self.client(&location.bucket)?;
        let object_path = ObjectPath::from(location.key());
        match store.head(&object_path).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bucket_url_formats() {
        let buckets = vec!["noauth".to_string()];
        let storage = S3Storage::new(&buckets, "us-east-1".to_string(), None)
            .await
            .unwrap();
        let location = ObjectLocation::new("noauth", "wallpapers/zips/", "a.zip");
        assert_eq!(
            storage.gen_url(&location, false),
            "https://noauth.s3.us-east-1.amazonaws.com/wallpapers/zips/a.zip"
        );

        let storage = S3Storage::new(
            &buckets,
            "us-east-1".to_string(),
            Some("http://localhost:9000/".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(
            storage.gen_url(&location, true),
            "http://localhost:9000/noauth/wallpapers/zips/a.zip"
        );
    }

    #[tokio::test]
    async fn test_unknown_bucket_is_rejected() {
        let buckets = vec!["noauth".to_string()];
        let storage = S3Storage::new(&buckets, "us-east-1".to_string(), None)
            .await
            .unwrap();
        let location = ObjectLocation::new("private", "x/", "a.jpg");
        let result = storage
            .store(Path::new("/nonexistent"), &location, StoreMode::Single)
            .await;
        assert!(matches!(result, Err(StorageError::UnknownBucket(_))));
    }
}
