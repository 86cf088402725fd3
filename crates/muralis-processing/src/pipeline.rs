//! Asset pipeline: validate → compress → store master → cover / crops / archive.
//!
//! A run owns a [`RunWorkspace`] for every derived file and a single run code
//! that prefixes every stored object name. After the master is stored and
//! checksummed, the cover, crop and archive branches run concurrently; the run
//! completes only when all three have joined. Any failure aborts the run with
//! one [`PipelineError`]. Objects stored before the failure are left in place.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use muralis_core::constants::{COVER_SIZE, CROP_PREFIX, ORIGIN_PREFIX, VARIANT_SIZES, ZIPS_PREFIX};
use muralis_core::models::{
    ArchiveInfo, AssetDescriptor, AssetStatus, UploadRequest, ValidationResult, VariantSize,
};
use muralis_core::{AppError, ErrorMetadata, LogLevel, PipelineConfig};
use muralis_storage::{generate_relative_path, AssetStore, ObjectLocation};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::archive::ArchiveBuilder;
use crate::checksum::{checksum, checksum_best_effort};
use crate::image::ImageTransformer;
use crate::validator::Validator;
use crate::workspace::{DerivedFile, RunWorkspace};

/// Progress of a run. Branch stages after `MasterStored` advance
/// independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Pending,
    Compressed,
    MasterStored,
    CoverGenerated,
    CoverStored,
    CropsStored,
    ArchiveBuilt,
    ArchiveStored,
    Complete,
    Failed,
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            PipelineStage::Pending => "pending",
            PipelineStage::Compressed => "compressed",
            PipelineStage::MasterStored => "master_stored",
            PipelineStage::CoverGenerated => "cover_generated",
            PipelineStage::CoverStored => "cover_stored",
            PipelineStage::CropsStored => "crops_stored",
            PipelineStage::ArchiveBuilt => "archive_built",
            PipelineStage::ArchiveStored => "archive_stored",
            PipelineStage::Complete => "complete",
            PipelineStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// The single fault a failed run reports.
///
/// `stage` is the stage the failing step was trying to reach.
#[derive(Debug, thiserror::Error)]
#[error("Pipeline failed before reaching {stage}: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub source: AppError,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, source: impl Into<AppError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}

impl ErrorMetadata for PipelineError {
    fn error_code(&self) -> &'static str {
        self.source.error_code()
    }

    fn is_recoverable(&self) -> bool {
        self.source.is_recoverable()
    }

    fn client_message(&self) -> String {
        self.source.client_message()
    }

    fn is_sensitive(&self) -> bool {
        self.source.is_sensitive()
    }

    fn log_level(&self) -> LogLevel {
        self.source.log_level()
    }
}

/// Attach the stage a step was working towards to its error.
trait AtStage<T> {
    fn at(self, stage: PipelineStage) -> Result<T, PipelineError>;
}

impl<T, E: Into<AppError>> AtStage<T> for Result<T, E> {
    fn at(self, stage: PipelineStage) -> Result<T, PipelineError> {
        self.map_err(|e| PipelineError::new(stage, e))
    }
}

/// Result of [`AssetPipeline::ingest`]
#[derive(Debug)]
pub enum IngestOutcome {
    /// Validation found user-correctable problems; nothing was stored.
    Rejected(ValidationResult),
    Completed(Box<AssetDescriptor>),
}

impl IngestOutcome {
    pub fn descriptor(&self) -> Option<&AssetDescriptor> {
        match self {
            IngestOutcome::Completed(descriptor) => Some(descriptor),
            IngestOutcome::Rejected(_) => None,
        }
    }

    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            IngestOutcome::Rejected(result) => Some(result),
            IngestOutcome::Completed(_) => None,
        }
    }
}

/// Run CPU-bound or blocking file work off the async executor.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}

/// Run blocking work against the run workspace.
///
/// The job holds its own handle on the workspace: the directory is removed
/// only after the run and every job it spawned have let go of it, even when
/// the awaiting future is dropped first.
pub(crate) async fn blocking_in<T, F>(workspace: &Arc<RunWorkspace>, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Path) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let workspace = Arc::clone(workspace);
    blocking(move || f(workspace.path())).await
}

/// Per-run identity shared by every branch.
struct RunContext {
    code: Uuid,
    created_at: DateTime<Utc>,
    workspace: Arc<RunWorkspace>,
}

impl RunContext {
    fn millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }

    fn object_name(&self, file: &DerivedFile, suffix: &str) -> String {
        generate_relative_path(&file.file_name, &self.code.to_string(), "", suffix)
    }

    fn advance(&self, stage: PipelineStage) {
        tracing::info!(code = %self.code, stage = %stage, "Pipeline stage reached");
    }
}

/// Join the configured base path and a fixed object prefix.
fn object_path(base: &str, prefix: &str) -> String {
    let base = base.trim_matches('/');
    if base.is_empty() {
        prefix.to_string()
    } else {
        format!("{}/{}", base, prefix)
    }
}

/// Wallpaper ingestion pipeline
#[derive(Clone)]
pub struct AssetPipeline {
    store: Arc<dyn AssetStore>,
    config: Arc<PipelineConfig>,
    validator: Validator,
}

impl AssetPipeline {
    pub fn new(store: Arc<dyn AssetStore>, config: PipelineConfig) -> Self {
        let validator = Validator::from_config(&config);
        Self {
            store,
            config: Arc::new(config),
            validator,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Validate `request` and, when it is clean, run it through the pipeline.
    pub async fn ingest(&self, request: &UploadRequest) -> Result<IngestOutcome, PipelineError> {
        let validator = self.validator.clone();
        let owned = request.clone();
        let validation = blocking(move || validator.validate_single(&owned).map_err(AppError::from))
            .await
            .at(PipelineStage::Pending)?;

        if !validation.is_empty() {
            tracing::info!(errors = validation.len(), "Upload rejected by validation");
            return Ok(IngestOutcome::Rejected(validation));
        }

        let descriptor = self.run(request).await?;
        Ok(IngestOutcome::Completed(Box::new(descriptor)))
    }

    /// Run an already validated request.
    pub async fn run(&self, request: &UploadRequest) -> Result<AssetDescriptor, PipelineError> {
        let workspace = RunWorkspace::new_in(self.config.work_dir.as_deref())
            .at(PipelineStage::Pending)?;
        let ctx = RunContext {
            code: Uuid::new_v4(),
            created_at: Utc::now(),
            workspace: Arc::new(workspace),
        };
        let start = Instant::now();

        tracing::info!(code = %ctx.code, name = %request.name, "Starting pipeline run");

        match self.execute(&ctx, request).await {
            Ok(descriptor) => {
                ctx.advance(PipelineStage::Complete);
                tracing::info!(
                    code = %ctx.code,
                    crops = descriptor.crops.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Pipeline run complete"
                );
                Ok(descriptor)
            }
            Err(e) => {
                tracing::error!(
                    code = %ctx.code,
                    stage = %PipelineStage::Failed,
                    failed_step = %e.stage,
                    error = %e.source,
                    error_code = e.error_code(),
                    "Pipeline run failed"
                );
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        ctx: &RunContext,
        request: &UploadRequest,
    ) -> Result<AssetDescriptor, PipelineError> {
        let upload = request
            .file
            .as_ref()
            .ok_or_else(|| AppError::InvalidInput("Upload has no file".to_string()))
            .at(PipelineStage::Pending)?;
        let original = DerivedFile::from(upload);
        let size = original.len().at(PipelineStage::Pending)?;

        let master = {
            let threshold = self.config.compress_threshold_bytes;
            let quality = self.config.compress_quality;
            blocking_in(&ctx.workspace, move |out_dir| {
                ImageTransformer::compress_if_large(&original, threshold, quality, out_dir)
            })
            .await
            .at(PipelineStage::Compressed)?
        };
        ctx.advance(PipelineStage::Compressed);

        let origin_path = object_path(&self.config.upload_base_path, ORIGIN_PREFIX);
        let master_name = ctx.object_name(&master, &format!("_{}", ctx.millis()));
        let file_url = self
            .store_object(ctx, &master, &origin_path, master_name)
            .await
            .at(PipelineStage::MasterStored)?;

        let master_path = master.path.clone();
        let master_checksum = blocking_in(&ctx.workspace, move |_| {
            checksum(&master_path).map_err(|e| {
                AppError::Checksum(format!("{}: {}", master_path.display(), e))
            })
        })
        .await
        .at(PipelineStage::MasterStored)?;
        ctx.advance(PipelineStage::MasterStored);

        let (cover_url, crops, archive) = tokio::try_join!(
            self.cover_branch(ctx, &master, &origin_path),
            self.crops_branch(ctx, &master),
            self.archive_branch(ctx, request, &master),
        )?;

        let target_packages: BTreeSet<String> = if request.target_packages.is_empty() {
            self.config.target_packages.iter().cloned().collect()
        } else {
            request.target_packages.clone()
        };

        let descriptor = AssetDescriptor {
            code: ctx.code,
            name: request.name.clone(),
            author: request.author.clone(),
            categories: request.categories.clone(),
            source: self.config.source.clone(),
            size,
            file_url,
            checksum: master_checksum,
            cover_url,
            crops,
            archive,
            created_at: ctx.created_at,
            terminal: request.terminal.filter(|t| t.is_bounded()),
            target_packages,
            status: AssetStatus::PendingVerification,
        };

        if !descriptor.is_complete(&VARIANT_SIZES) {
            return Err(PipelineError::new(
                PipelineStage::Complete,
                AppError::Internal("Assembled descriptor is incomplete".to_string()),
            ));
        }

        Ok(descriptor)
    }

    async fn cover_branch(
        &self,
        ctx: &RunContext,
        master: &DerivedFile,
        origin_path: &str,
    ) -> Result<String, PipelineError> {
        let cover = self
            .scale(ctx, master, COVER_SIZE)
            .await
            .at(PipelineStage::CoverGenerated)?;
        ctx.advance(PipelineStage::CoverGenerated);

        let name = ctx.object_name(&cover, &format!("_cover_{}", ctx.millis()));
        let url = self
            .store_object(ctx, &cover, origin_path, name)
            .await
            .at(PipelineStage::CoverStored)?;
        ctx.advance(PipelineStage::CoverStored);
        Ok(url)
    }

    async fn crops_branch(
        &self,
        ctx: &RunContext,
        master: &DerivedFile,
    ) -> Result<BTreeMap<VariantSize, String>, PipelineError> {
        let concurrency = self.config.max_concurrent_variants.max(1);

        let crops: BTreeMap<VariantSize, String> = stream::iter(VARIANT_SIZES.iter().copied())
            .map(|size| self.produce_crop(ctx, master, size))
            .buffer_unordered(concurrency)
            .try_collect::<BTreeMap<_, _>>()
            .await
            .at(PipelineStage::CropsStored)?;

        if crops.len() != VARIANT_SIZES.len() {
            return Err(PipelineError::new(
                PipelineStage::CropsStored,
                AppError::Internal(format!(
                    "Expected {} crops, produced {}",
                    VARIANT_SIZES.len(),
                    crops.len()
                )),
            ));
        }

        ctx.advance(PipelineStage::CropsStored);
        Ok(crops)
    }

    async fn produce_crop(
        &self,
        ctx: &RunContext,
        master: &DerivedFile,
        size: VariantSize,
    ) -> Result<(VariantSize, String), AppError> {
        let crop = self.scale(ctx, master, size).await?;
        let path = object_path(
            &self.config.upload_base_path,
            &format!("{}{}/", CROP_PREFIX, size),
        );
        let name = ctx.object_name(&crop, &format!("_cover_{}", ctx.millis()));
        let url = self.store_object(ctx, &crop, &path, name).await?;
        Ok((size, url))
    }

    async fn archive_branch(
        &self,
        ctx: &RunContext,
        request: &UploadRequest,
        master: &DerivedFile,
    ) -> Result<ArchiveInfo, PipelineError> {
        let archive = {
            let name = request.name.clone();
            let author = request.author.clone();
            let master = master.clone();
            blocking_in(&ctx.workspace, move |out_dir| {
                ArchiveBuilder::build_archive(&name, &author, &master, out_dir)
            })
            .await
            .at(PipelineStage::ArchiveBuilt)?
        };
        ctx.advance(PipelineStage::ArchiveBuilt);

        let path = object_path(&self.config.upload_base_path, ZIPS_PREFIX);
        let name = ctx.object_name(&archive, &format!("_{}", ctx.millis()));
        let url = self
            .store_object(ctx, &archive, &path, name)
            .await
            .at(PipelineStage::ArchiveStored)?;

        let size = archive.len().at(PipelineStage::ArchiveStored)?;
        let archive_path = archive.path.clone();
        let archive_checksum =
            blocking_in(&ctx.workspace, move |_| Ok(checksum_best_effort(&archive_path)))
                .await
                .unwrap_or(None);
        ctx.advance(PipelineStage::ArchiveStored);

        Ok(ArchiveInfo {
            url,
            checksum: archive_checksum,
            size,
        })
    }

    async fn scale(
        &self,
        ctx: &RunContext,
        master: &DerivedFile,
        size: VariantSize,
    ) -> Result<DerivedFile, AppError> {
        let master = master.clone();
        blocking_in(&ctx.workspace, move |out_dir| {
            ImageTransformer::scale_exact(&master, size.width, size.height, out_dir)
        })
        .await
    }

    /// Store `file` in the public bucket and return its public URL.
    async fn store_object(
        &self,
        ctx: &RunContext,
        file: &DerivedFile,
        path: &str,
        name: String,
    ) -> Result<String, AppError> {
        let location = ObjectLocation::new(self.config.public_bucket.as_str(), path, name);
        let start = Instant::now();

        self.store
            .store(&file.path, &location, self.config.store_mode)
            .await?;

        tracing::info!(
            code = %ctx.code,
            key = %location.key(),
            size_bytes = file.len().unwrap_or(0),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored object"
        );

        Ok(self.store.gen_url(&location, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_joins_base() {
        assert_eq!(object_path("", ORIGIN_PREFIX), "wallpapers/images/origin/");
        assert_eq!(
            object_path("/uploads/", ZIPS_PREFIX),
            "uploads/wallpapers/zips/"
        );
    }

    #[test]
    fn test_pipeline_error_delegates_metadata() {
        let err = PipelineError::new(
            PipelineStage::CropsStored,
            AppError::Storage("put failed".to_string()),
        );
        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("crops_stored"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_at_stage_wraps_io_errors() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        let err = result.at(PipelineStage::Compressed).unwrap_err();
        assert_eq!(err.stage, PipelineStage::Compressed);
        assert!(matches!(err.source, AppError::Io(_)));
    }

    #[tokio::test]
    async fn test_blocking_propagates_result() {
        let value = blocking(|| Ok(21 * 2)).await.unwrap();
        assert_eq!(value, 42);

        let err = blocking::<(), _>(|| Err(AppError::Transform("bad".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transform(_)));
    }

    #[tokio::test]
    async fn test_workspace_outlives_abandoned_job() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = Arc::new(RunWorkspace::new_in(Some(parent.path())).unwrap());
        let dir = workspace.path().to_path_buf();
        let (release, wait) = std::sync::mpsc::channel::<()>();

        let job = blocking_in(&workspace, move |out_dir| {
            let _ = wait.recv();
            std::fs::write(out_dir.join("late.bin"), b"late")?;
            Ok(())
        });
        // The caller gives up while the job is still blocked.
        let abandoned =
            tokio::time::timeout(std::time::Duration::from_millis(50), job).await;
        assert!(abandoned.is_err());
        drop(workspace);
        assert!(dir.exists());

        release.send(()).unwrap();
        let mut removed = false;
        for _ in 0..100 {
            if !dir.exists() {
                removed = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(removed);
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }
}
