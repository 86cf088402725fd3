//! Image processing module
//!
//! Pure file-to-file transforms used by the pipeline:
//! - compress an oversized master (transformer)
//! - resample to an exact target size (transformer)

pub mod transformer;

pub use transformer::ImageTransformer;
