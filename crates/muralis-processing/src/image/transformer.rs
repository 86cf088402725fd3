//! Image transformer - compression and exact resampling
//!
//! Both operations read a file and, when they change anything, write a new file
//! into the caller's output directory (the run workspace). They are
//! synchronous; async callers run them on the blocking pool.

use crate::compression::ImageCompressor;
use crate::workspace::{reserve_path, DerivedFile};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use muralis_core::AppError;
use std::path::Path;

/// Main image transformer
pub struct ImageTransformer;

impl ImageTransformer {
    /// Re-encode `file` as JPEG at `quality` when it is larger than
    /// `threshold_bytes`; otherwise return it unchanged.
    pub fn compress_if_large(
        file: &DerivedFile,
        threshold_bytes: u64,
        quality: u8,
        out_dir: &Path,
    ) -> Result<DerivedFile, AppError> {
        let size = file.len()?;
        if size <= threshold_bytes {
            tracing::debug!(
                size_bytes = size,
                threshold_bytes = threshold_bytes,
                "Master below compression threshold, keeping original"
            );
            return Ok(file.clone());
        }

        let (img, _) = Self::decode(&file.path)?;
        let data = ImageCompressor::compress_jpeg(&img, quality)?;

        let path = reserve_path(out_dir, "master_", "jpg")?;
        std::fs::write(&path, &data)?;

        tracing::info!(
            original_bytes = size,
            compressed_bytes = data.len(),
            quality = quality,
            "Compressed oversized master"
        );

        Ok(DerivedFile::new(path, Self::renamed(&file.file_name, "jpg")))
    }

    /// Resample `file` to exactly `width`x`height`, ignoring aspect ratio.
    ///
    /// The output keeps the source's encoded format.
    pub fn scale_exact(
        file: &DerivedFile,
        width: u32,
        height: u32,
        out_dir: &Path,
    ) -> Result<DerivedFile, AppError> {
        if width == 0 || height == 0 {
            return Err(AppError::InvalidInput(format!(
                "Target size must be non-zero, got {}x{}",
                width, height
            )));
        }

        let (img, format) = Self::decode(&file.path)?;
        let filter = Self::select_filter(img.dimensions(), (width, height));
        let resized = img.resize_exact(width, height, filter);

        let extension = format.extensions_str().first().copied().unwrap_or("jpg");
        let data = ImageCompressor::encode(&resized, format)?;

        let path = reserve_path(out_dir, &format!("{}x{}_", width, height), extension)?;
        std::fs::write(&path, &data)?;

        Ok(DerivedFile::new(path, Self::renamed(&file.file_name, extension)))
    }

    /// Decode a file, returning the image and its detected format.
    ///
    /// Unknown formats fall back to JPEG for re-encoding.
    pub fn decode(path: &Path) -> Result<(DynamicImage, ImageFormat), AppError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader.format().unwrap_or(ImageFormat::Jpeg);
        let img = reader.decode().map_err(|e| {
            AppError::Transform(format!("Failed to decode {}: {}", path.display(), e))
        })?;
        Ok((img, format))
    }

    /// Lanczos for downscaling, Catmull-Rom when enlarging.
    fn select_filter(from: (u32, u32), to: (u32, u32)) -> FilterType {
        if to.0 <= from.0 && to.1 <= from.1 {
            FilterType::Lanczos3
        } else {
            FilterType::CatmullRom
        }
    }

    fn renamed(file_name: &str, extension: &str) -> String {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("image");
        format!("{}.{}", stem, extension)
    }
}
