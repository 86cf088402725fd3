//! Muralis Processing Library
//!
//! Turns one validated wallpaper upload into a stored asset set:
//!
//! - `validator` checks raw uploads and extracted batch sets
//! - `image` compresses and resamples images
//! - `checksum` digests files
//! - `archive` packages the master image and unpacks batch uploads
//! - `pipeline` orchestrates a run and assembles the `AssetDescriptor`
//! - `batch` feeds every image of a zip upload through the pipeline

pub mod archive;
pub mod batch;
pub mod checksum;
pub mod compression;
pub mod image;
pub mod pipeline;
pub mod validator;
pub mod workspace;

pub use archive::ArchiveBuilder;
pub use batch::BatchOutcome;
pub use checksum::{checksum, checksum_best_effort};
pub use crate::image::ImageTransformer;
pub use pipeline::{AssetPipeline, IngestOutcome, PipelineError, PipelineStage};
pub use validator::{FormatCheck, Validator};
pub use workspace::{DerivedFile, RunWorkspace};
