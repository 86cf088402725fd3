//! Zip upload of several wallpapers sharing the default display metadata.

use crate::archive::extract_archive;
use crate::pipeline::{blocking, blocking_in, AssetPipeline, PipelineError, PipelineStage};
use crate::workspace::RunWorkspace;
use muralis_core::models::{
    AssetDescriptor, UploadFile, UploadRequest, ValidationField, ValidationResult,
};
use muralis_core::AppError;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Result of [`AssetPipeline::ingest_batch`]
#[derive(Debug)]
pub enum BatchOutcome {
    /// The archive or one of its images failed validation; nothing was stored.
    Rejected(ValidationResult),
    /// One descriptor per image, in entry name order.
    Completed(Vec<AssetDescriptor>),
}

/// Images extracted from a batch upload, or the reason the upload is refused.
#[derive(Debug)]
enum Unpacked {
    Entries(Vec<PathBuf>),
    Rejected(ValidationResult),
}

/// Sort the result of extracting and validating a batch upload.
///
/// Only an unreadable archive is the uploader's fault. Any other failure is a
/// fault of the run.
fn classify_unpacked(
    unpacked: Result<(Vec<PathBuf>, ValidationResult), AppError>,
) -> Result<Unpacked, PipelineError> {
    let mut rejection = ValidationResult::new();
    match unpacked {
        Ok((_, validation)) if !validation.is_empty() => Ok(Unpacked::Rejected(validation)),
        Ok((entries, _)) if entries.is_empty() => {
            rejection.push(ValidationField::File, "The archive contains no images");
            Ok(Unpacked::Rejected(rejection))
        }
        Ok((entries, _)) => Ok(Unpacked::Entries(entries)),
        Err(AppError::Archive(reason)) => {
            tracing::warn!(error = %reason, "Batch upload is not a readable zip archive");
            rejection.push(ValidationField::File, "Please upload a valid zip archive");
            Ok(Unpacked::Rejected(rejection))
        }
        Err(e) => Err(PipelineError::new(PipelineStage::Pending, e)),
    }
}

impl AssetPipeline {
    /// Validate a zip upload, then run every image it contains through the
    /// pipeline, one after the other. The first failing run aborts the batch;
    /// descriptors of the runs that already completed are discarded with it.
    pub async fn ingest_batch(
        &self,
        archive: Option<&UploadFile>,
        categories: BTreeSet<String>,
    ) -> Result<BatchOutcome, PipelineError> {
        let validator = self.validator().clone();
        let owned = archive.cloned();
        let validation = blocking(move || {
            validator
                .validate_batch(owned.as_ref())
                .map_err(AppError::from)
        })
        .await
        .map_err(|e| PipelineError::new(PipelineStage::Pending, e))?;
        if !validation.is_empty() {
            return Ok(BatchOutcome::Rejected(validation));
        }
        let Some(archive) = archive else {
            return Ok(BatchOutcome::Rejected(validation));
        };

        let workspace = RunWorkspace::new_in(self.config().work_dir.as_deref())
            .map_err(|e| PipelineError::new(PipelineStage::Pending, e))?;
        let entries = match self.unpack(archive, &Arc::new(workspace)).await? {
            Unpacked::Entries(entries) => entries,
            Unpacked::Rejected(rejection) => return Ok(BatchOutcome::Rejected(rejection)),
        };

        let config = self.config();
        let mut descriptors = Vec::with_capacity(entries.len());
        for (index, path) in entries.into_iter().enumerate() {
            let request = UploadRequest {
                file: Some(UploadFile::from_path(path)),
                name: config.default_name.clone(),
                author: config.default_author.clone(),
                categories: categories.clone(),
                ..Default::default()
            };

            tracing::info!(entry = index, "Ingesting batch entry");
            descriptors.push(self.run(&request).await?);
        }

        tracing::info!(count = descriptors.len(), "Batch ingest complete");
        Ok(BatchOutcome::Completed(descriptors))
    }

    /// Extract and validate the images of `archive`.
    ///
    /// A corrupt archive or an empty image set is a rejection, like any other
    /// validation problem.
    async fn unpack(
        &self,
        archive: &UploadFile,
        workspace: &Arc<RunWorkspace>,
    ) -> Result<Unpacked, PipelineError> {
        let zip_path = archive.path.clone();
        let validator = self.validator().clone();

        let unpacked = blocking_in(workspace, move |out_dir| {
            let entries = extract_archive(&zip_path, out_dir)?;
            let validation = validator.validate_extracted_set(out_dir)?;
            Ok((entries, validation))
        })
        .await;

        classify_unpacked(unpacked)
    }
}
