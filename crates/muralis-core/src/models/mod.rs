//! Domain models for the asset pipeline.

pub mod asset;
pub mod upload;
pub mod validation;
pub mod variant;

pub use asset::{ArchiveInfo, AssetDescriptor, AssetStatus};
pub use upload::{TerminalRange, UploadFile, UploadRequest};
pub use validation::{FieldError, ValidationField, ValidationResult};
pub use variant::VariantSize;
