//! Image encoding with explicit quality control.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use muralis_core::AppError;
use std::io::Cursor;

/// Encoding service for derived images
pub struct ImageCompressor;

impl ImageCompressor {
    /// Encode as baseline JPEG at `quality` (1-100).
    ///
    /// JPEG has no alpha channel; transparent pixels are flattened by dropping
    /// alpha.
    pub fn compress_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, AppError> {
        let quality = quality.clamp(1, 100);
        let rgb_img = img.to_rgb8();

        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb_img
            .write_with_encoder(encoder)
            .map_err(|e| AppError::Transform(format!("JPEG encoding failed: {}", e)))?;

        tracing::debug!(
            quality = quality,
            size_bytes = buffer.len(),
            "Encoded JPEG"
        );

        Ok(buffer)
    }

    /// Encode in `format`, using the encoder's default settings.
    pub fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, AppError> {
        let img = match format {
            // JPEG cannot carry alpha
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
            _ => img.clone(),
        };

        let (width, height) = (img.width(), img.height());
        let mut buffer = Vec::with_capacity((width * height * 3) as usize);
        img.write_to(&mut Cursor::new(&mut buffer), format)
            .map_err(|e| AppError::Transform(format!("{:?} encoding failed: {}", format, e)))?;

        Ok(buffer)
    }
}
