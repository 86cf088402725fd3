//! In-memory `AssetStore` for tests, with failure injection.

use crate::keys::ObjectLocation;
use crate::traits::{AssetStore, StorageError, StorageResult};
use crate::{StorageBackend, StoreMode};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

type FailurePredicate = Box<dyn Fn(&ObjectLocation) -> bool + Send + Sync>;

/// Mock store that keeps objects in memory
pub struct MockStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    order: Arc<Mutex<Vec<String>>>,
    fail_when: Option<FailurePredicate>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            order: Arc::new(Mutex::new(Vec::new())),
            fail_when: None,
        }
    }

    /// Reject every `store` call whose location matches `predicate`.
    pub fn failing_when<F>(predicate: F) -> Self
    where
        F: Fn(&ObjectLocation) -> bool + Send + Sync + 'static,
    {
        Self {
            fail_when: Some(Box::new(predicate)),
            ..Self::new()
        }
    }

    /// Check if an object was stored, by `bucket/key`
    pub fn has_object(&self, full_key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(full_key)
    }

    /// Get object data (for test assertions)
    pub fn get_object(&self, full_key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(full_key).cloned()
    }

    /// Every successfully stored `bucket/key`, in completion order
    pub fn stored_keys(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetStore for MockStore {
    async fn store(
        &self,
        file: &Path,
        location: &ObjectLocation,
        _mode: StoreMode,
    ) -> StorageResult<()> {
        location.validate()?;

        if let Some(predicate) = &self.fail_when {
            if predicate(location) {
                return Err(StorageError::UploadFailed(format!(
                    "injected failure for {}",
                    location
                )));
            }
        }

        let data = tokio::fs::read(file).await?;
        let full_key = location.to_string();
        self.objects.lock().unwrap().insert(full_key.clone(), data);
        self.order.lock().unwrap().push(full_key);
        Ok(())
    }

    fn gen_url(&self, location: &ObjectLocation, _auth_required: bool) -> String {
        format!("https://cdn.test/{}", location)
    }

    async fn exists(&self, location: &ObjectLocation) -> StorageResult<bool> {
        Ok(self.has_object(&location.to_string()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
