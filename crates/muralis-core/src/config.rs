//! Configuration module
//!
//! Configuration is read once at startup and passed explicitly into the
//! storage factory and the pipeline constructor. Nothing here is global.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{
    COMPRESS_QUALITY, COMPRESS_THRESHOLD_BYTES, DEFAULT_ASSET_AUTHOR, DEFAULT_ASSET_NAME,
    DEFAULT_ASSET_SOURCE, DEFAULT_PUBLIC_BUCKET, DEFAULT_TARGET_PACKAGES, REQUIRED_HEIGHT,
    REQUIRED_WIDTH, VARIANT_SIZES,
};
use crate::storage_types::{StorageBackend, StoreMode};

/// Storage backend selection and connection settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    /// CDN base used for public URLs instead of the backend's own URL.
    pub public_base_url: Option<String>,
    /// Every bucket the backend must be able to write to.
    pub buckets: Vec<String>,
}

/// Settings consumed by the asset pipeline
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Prefix prepended to every object path, e.g. `uploads/`.
    pub upload_base_path: String,
    pub public_bucket: String,
    pub store_mode: StoreMode,
    pub compress_threshold_bytes: u64,
    pub compress_quality: u8,
    pub required_width: u32,
    pub required_height: u32,
    pub max_concurrent_variants: usize,
    /// Reproduce the historical format check that only accepts `jpg`.
    pub legacy_format_check: bool,
    pub source: String,
    pub default_name: String,
    pub default_author: String,
    pub target_packages: Vec<String>,
    /// Parent directory for per-run scratch space; the system temp dir when unset.
    pub work_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upload_base_path: String::new(),
            public_bucket: DEFAULT_PUBLIC_BUCKET.to_string(),
            store_mode: StoreMode::Single,
            compress_threshold_bytes: COMPRESS_THRESHOLD_BYTES,
            compress_quality: COMPRESS_QUALITY,
            required_width: REQUIRED_WIDTH,
            required_height: REQUIRED_HEIGHT,
            max_concurrent_variants: VARIANT_SIZES.len(),
            legacy_format_check: false,
            source: DEFAULT_ASSET_SOURCE.to_string(),
            default_name: DEFAULT_ASSET_NAME.to_string(),
            default_author: DEFAULT_ASSET_AUTHOR.to_string(),
            target_packages: DEFAULT_TARGET_PACKAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            work_dir: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.public_bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("PUBLIC_BUCKET must not be empty"));
        }

        if !(1..=100).contains(&self.compress_quality) {
            return Err(anyhow::anyhow!(
                "COMPRESS_QUALITY must be between 1 and 100, got {}",
                self.compress_quality
            ));
        }

        if self.required_width == 0 || self.required_height == 0 {
            return Err(anyhow::anyhow!(
                "REQUIRED_WIDTH and REQUIRED_HEIGHT must be positive"
            ));
        }

        if self.max_concurrent_variants == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_VARIANTS must be at least 1"));
        }

        if self.upload_base_path.contains("..") || self.upload_base_path.starts_with('/') {
            return Err(anyhow::anyhow!(
                "UPLOAD_BASE_PATH must be relative and must not contain '..'"
            ));
        }

        Ok(())
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PipelineConfig::default();

        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::Local,
        };

        let public_bucket =
            lookup("PUBLIC_BUCKET").unwrap_or_else(|| DEFAULT_PUBLIC_BUCKET.to_string());

        let mut buckets = vec![public_bucket.clone()];
        if let Some(private) = lookup("PRIVATE_BUCKET").filter(|b| !b.trim().is_empty()) {
            if private != public_bucket {
                buckets.push(private);
            }
        }

        let storage = StorageConfig {
            backend,
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL"),
            s3_region: lookup("S3_REGION").or_else(|| lookup("AWS_REGION")),
            s3_endpoint: lookup("S3_ENDPOINT"),
            public_base_url: lookup("PUBLIC_BASE_URL"),
            buckets,
        };

        let mut upload_base_path = lookup("UPLOAD_BASE_PATH").unwrap_or_default();
        if !upload_base_path.is_empty() && !upload_base_path.ends_with('/') {
            upload_base_path.push('/');
        }

        let target_packages = match lookup("TARGET_PACKAGES") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.target_packages.clone(),
        };

        let pipeline = PipelineConfig {
            upload_base_path,
            public_bucket,
            store_mode: parse_or(&lookup, "STORE_MODE", defaults.store_mode)?,
            compress_threshold_bytes: parse_or(
                &lookup,
                "COMPRESS_THRESHOLD_BYTES",
                defaults.compress_threshold_bytes,
            )?,
            compress_quality: parse_or(&lookup, "COMPRESS_QUALITY", defaults.compress_quality)?,
            required_width: parse_or(&lookup, "REQUIRED_WIDTH", defaults.required_width)?,
            required_height: parse_or(&lookup, "REQUIRED_HEIGHT", defaults.required_height)?,
            max_concurrent_variants: parse_or(
                &lookup,
                "MAX_CONCURRENT_VARIANTS",
                defaults.max_concurrent_variants,
            )?,
            legacy_format_check: parse_or(
                &lookup,
                "LEGACY_FORMAT_CHECK",
                defaults.legacy_format_check,
            )?,
            source: lookup("ASSET_SOURCE").unwrap_or(defaults.source),
            default_name: lookup("DEFAULT_ASSET_NAME").unwrap_or(defaults.default_name),
            default_author: lookup("DEFAULT_ASSET_AUTHOR").unwrap_or(defaults.default_author),
            target_packages,
            work_dir: lookup("WORK_DIR")
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
        };

        Ok(Config {
            environment,
            storage,
            pipeline,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage.backend {
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none()
                    || self.storage.local_storage_base_url.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "STORAGE_BACKEND=local requires LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL"
                    ));
                }
            }
            StorageBackend::S3 => {
                if self.storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "STORAGE_BACKEND=s3 requires S3_REGION or AWS_REGION"
                    ));
                }
            }
        }

        self.pipeline.validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert_eq!(config.pipeline.compress_threshold_bytes, 200 * 1024);
        assert_eq!(config.pipeline.compress_quality, 80);
        assert_eq!(config.pipeline.required_width, 960);
        assert_eq!(config.pipeline.required_height, 800);
        assert!(!config.pipeline.legacy_format_check);
        assert_eq!(config.storage.buckets, vec!["noauth".to_string()]);
        assert!(config.pipeline.validate().is_ok());
    }

    #[test]
    fn test_local_backend_requires_path_and_url() {
        let config = config_from(&[("STORAGE_BACKEND", "local")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/var/lib/muralis"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:3000/media"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_s3_backend_requires_region() {
        let config = config_from(&[("STORAGE_BACKEND", "s3")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("STORAGE_BACKEND", "s3"), ("AWS_REGION", "us-east-1")]).unwrap();
        assert_eq!(config.storage.s3_region.as_deref(), Some("us-east-1"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        assert!(config_from(&[("COMPRESS_QUALITY", "high")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "ftp")]).is_err());
    }

    #[test]
    fn test_quality_out_of_range_fails_validation() {
        let config = config_from(&[("COMPRESS_QUALITY", "0")]).unwrap();
        assert!(config.pipeline.validate().is_err());
    }

    #[test]
    fn test_base_path_is_normalized() {
        let config = config_from(&[("UPLOAD_BASE_PATH", "static")]).unwrap();
        assert_eq!(config.pipeline.upload_base_path, "static/");

        let config = config_from(&[("UPLOAD_BASE_PATH", "../escape/")]).unwrap();
        assert!(config.pipeline.validate().is_err());
    }

    #[test]
    fn test_work_dir_is_optional() {
        assert!(config_from(&[]).unwrap().pipeline.work_dir.is_none());

        let config = config_from(&[("WORK_DIR", "/var/tmp/muralis")]).unwrap();
        assert_eq!(
            config.pipeline.work_dir.as_deref(),
            Some(std::path::Path::new("/var/tmp/muralis"))
        );
    }

    #[test]
    fn test_private_bucket_is_registered() {
        let config = config_from(&[("PUBLIC_BUCKET", "pub"), ("PRIVATE_BUCKET", "priv")]).unwrap();
        assert_eq!(config.storage.buckets, vec!["pub".to_string(), "priv".to_string()]);
    }

    #[test]
    fn test_target_packages_override() {
        let config = config_from(&[("TARGET_PACKAGES", "a, b,,c")]).unwrap();
        assert_eq!(config.pipeline.target_packages, vec!["a", "b", "c"]);
    }
}
