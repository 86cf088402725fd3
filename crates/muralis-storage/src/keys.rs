//! Shared key generation for storage backends.
//!
//! An object lives at `{path}{name}` inside its bucket. `path` is normalised to
//! have no leading `/` and exactly one trailing `/` (or to be empty).

use crate::{StorageError, StorageResult};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Where an object is stored: bucket, directory-like path and object name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    pub bucket: String,
    pub path: String,
    pub name: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, path: impl AsRef<str>, name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: normalize_path(path.as_ref()),
            name: name.into(),
        }
    }

    /// Storage key inside the bucket.
    pub fn key(&self) -> String {
        format!("{}{}", self.path, self.name)
    }

    /// Validate the bucket and key before touching a backend.
    pub fn validate(&self) -> StorageResult<()> {
        if self.bucket.is_empty() || self.bucket.contains('/') || self.bucket.contains("..") {
            return Err(StorageError::InvalidKey(format!(
                "Invalid bucket name: {:?}",
                self.bucket
            )));
        }

        if self.name.is_empty() || self.name.contains('/') {
            return Err(StorageError::InvalidKey(format!(
                "Invalid object name: {:?}",
                self.name
            )));
        }

        let key = self.key();
        if key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl Display for ObjectLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.bucket, self.key())
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// Generate the object name for a derived file.
///
/// Format: `{prefix}{code}{suffix}.{ext}`, with the extension taken from
/// `file_name` (lowercased). The run code makes names unique across runs; the
/// suffix separates objects of the same run that share a path.
pub fn generate_relative_path(file_name: &str, code: &str, prefix: &str, suffix: &str) -> String {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension {
        Some(ext) if !ext.is_empty() => format!("{}{}{}.{}", prefix, code, suffix, ext),
        _ => format!("{}{}{}", prefix, code, suffix),
    }
}
