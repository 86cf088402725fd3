use image::ImageReader;
use muralis_core::constants::{ACCEPTED_IMAGE_EXTENSIONS, BATCH_ARCHIVE_EXTENSION};
use muralis_core::models::{UploadFile, UploadRequest, ValidationField, ValidationResult};
use muralis_core::PipelineConfig;
use std::io;
use std::path::Path;

/// Which extension test is applied to uploaded images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatCheck {
    /// Accept every extension in `ACCEPTED_IMAGE_EXTENSIONS`
    #[default]
    Strict,
    /// Historical behaviour: only `jpg` passes
    Legacy,
}

impl FormatCheck {
    pub fn accepts(&self, extension: &str) -> bool {
        match self {
            FormatCheck::Strict => ACCEPTED_IMAGE_EXTENSIONS.contains(&extension),
            FormatCheck::Legacy => extension == "jpg",
        }
    }
}

/// Wallpaper upload validator
///
/// Problems the user can fix are collected into a [`ValidationResult`];
/// only I/O failures are returned as errors.
#[derive(Debug, Clone)]
pub struct Validator {
    required_width: u32,
    required_height: u32,
    format_check: FormatCheck,
}

impl Validator {
    pub fn new(required_width: u32, required_height: u32, format_check: FormatCheck) -> Self {
        Self {
            required_width,
            required_height,
            format_check,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        let format_check = if config.legacy_format_check {
            FormatCheck::Legacy
        } else {
            FormatCheck::Strict
        };
        Self::new(config.required_width, config.required_height, format_check)
    }

    /// Validate a single wallpaper upload and its display metadata.
    pub fn validate_single(&self, request: &UploadRequest) -> io::Result<ValidationResult> {
        let mut result = ValidationResult::new();

        match request.file.as_ref() {
            Some(file) if Self::has_content(&file.path)? => {
                let accepted = file
                    .extension()
                    .map(|ext| self.format_check.accepts(&ext))
                    .unwrap_or(false);

                if !accepted {
                    result.push(ValidationField::File, "Please upload a jpg or png image");
                } else if !self.has_required_dimensions(&file.path) {
                    result.push(
                        ValidationField::File,
                        format!(
                            "Please upload an image of {}x{}",
                            self.required_width, self.required_height
                        ),
                    );
                }
            }
            _ => result.push(ValidationField::File, "Please upload a file"),
        }

        if request.name.trim().is_empty() {
            result.push(ValidationField::Name, "Please enter a wallpaper name");
        }
        if request.author.trim().is_empty() {
            result.push(ValidationField::Author, "Please enter the wallpaper author");
        }
        if request.terminal.is_some_and(|t| t.is_inverted()) {
            result.push(
                ValidationField::Terminal,
                "Terminal width or height range is invalid",
            );
        }

        Ok(result)
    }

    /// Validate a batch upload. Only the container is checked here; the
    /// images inside are checked after extraction.
    pub fn validate_batch(&self, file: Option<&UploadFile>) -> io::Result<ValidationResult> {
        let mut result = ValidationResult::new();

        match file {
            Some(file) if Self::has_content(&file.path)? => {
                if file.extension().as_deref() != Some(BATCH_ARCHIVE_EXTENSION) {
                    result.push(
                        ValidationField::File,
                        "Please upload the image set as a zip archive",
                    );
                }
            }
            _ => result.push(ValidationField::File, "Please upload a file"),
        }

        Ok(result)
    }

    /// Validate every regular file directly inside `dir`, in name order.
    ///
    /// Every entry is checked for format and size and all problems are
    /// reported, not just the first.
    pub fn validate_extracted_set(&self, dir: &Path) -> io::Result<ValidationResult> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                entries.push(entry.path());
            }
        }
        entries.sort();

        let mut result = ValidationResult::new();
        for path in entries {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let accepted = UploadFile::new(&path, name.as_str())
                .extension()
                .map(|ext| self.format_check.accepts(&ext))
                .unwrap_or(false);

            if !accepted {
                result.push(
                    ValidationField::File,
                    format!("{}: unsupported file format", name),
                );
            }
            if !self.has_required_dimensions(&path) {
                result.push(
                    ValidationField::File,
                    format!(
                        "{}: image must be {}x{}",
                        name, self.required_width, self.required_height
                    ),
                );
            }
        }

        tracing::debug!(
            dir = %dir.display(),
            errors = result.len(),
            "Validated extracted image set"
        );

        Ok(result)
    }

    /// A missing or empty file is a validation problem, not an I/O fault.
    fn has_content(path: &Path) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(meta.is_file() && meta.len() > 0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Reads only the image header. Undecodable content fails the check.
    fn has_required_dimensions(&self, path: &Path) -> bool {
        let dimensions = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(image::ImageError::from)
            .and_then(|reader| reader.into_dimensions());

        match dimensions {
            Ok((width, height)) => width == self.required_width && height == self.required_height,
            Err(e) => {
                tracing::debug!(error = %e, path = %path.display(), "Could not read image header");
                false
            }
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use muralis_core::models::TerminalRange;
    use std::path::PathBuf;

    fn write_image(dir: &Path, name: &str, width: u32, height: u32, format: ImageFormat) -> PathBuf {
        let path = dir.join(name);
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .save_with_format(&path, format)
            .unwrap();
        path
    }

    fn request(dir: &Path, name: &str, width: u32, height: u32) -> UploadRequest {
        let format = if name.ends_with(".png") {
            ImageFormat::Png
        } else {
            ImageFormat::Jpeg
        };
        let path = write_image(dir, name, width, height, format);
        UploadRequest::new(UploadFile::new(path, name), "Sunset", "Ann")
    }

    #[test]
    fn test_valid_upload_has_no_errors() {
        let dir = tempfile::tempdir().unwrap();
        let validator = Validator::default();

        for name in ["a.jpg", "b.jpeg", "c.png", "D.JPG"] {
            let result = validator
                .validate_single(&request(dir.path(), name, 960, 800))
                .unwrap();
            assert!(result.is_empty(), "{}: {}", name, result);
        }
    }

    #[test]
    fn test_wrong_dimensions_is_single_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Validator::default()
            .validate_single(&request(dir.path(), "small.jpg", 500, 500))
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.errors()[0].field, ValidationField::File);
        assert_eq!(result.errors()[0].message, "Please upload an image of 960x800");
    }

    #[test]
    fn test_missing_file_suppresses_format_and_dimension_checks() {
        let validator = Validator::default();

        let result = validator.validate_single(&UploadRequest::default()).unwrap();
        assert_eq!(result.for_field(ValidationField::File).count(), 1);
        assert!(result.has_field(ValidationField::Name));
        assert!(result.has_field(ValidationField::Author));
        assert_eq!(result.len(), 3);

        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, b"").unwrap();
        let request = UploadRequest::new(UploadFile::new(&empty, "empty.txt"), "n", "a");
        let result = validator.validate_single(&request).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.errors()[0].message, "Please upload a file");

        let request = UploadRequest::new(
            UploadFile::new(dir.path().join("gone.jpg"), "gone.jpg"),
            "n",
            "a",
        );
        let result = validator.validate_single(&request).unwrap();
        assert_eq!(result.errors()[0].message, "Please upload a file");
    }

    #[test]
    fn test_unsupported_extension_skips_dimension_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.bin");
        std::fs::write(&path, b"GIF89a....").unwrap();
        let request = UploadRequest::new(UploadFile::new(path, "anim.gif"), "n", "a");

        let result = Validator::default().validate_single(&request).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.errors()[0].message, "Please upload a jpg or png image");
    }

    #[test]
    fn test_undecodable_image_is_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        let request = UploadRequest::new(UploadFile::new(path, "broken.jpg"), "n", "a");

        let result = Validator::default().validate_single(&request).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.errors()[0].field, ValidationField::File);
    }

    #[test]
    fn test_blank_name_and_author() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request(dir.path(), "a.jpg", 960, 800);
        req.name = "   ".to_string();
        req.author = String::new();

        let result = Validator::default().validate_single(&req).unwrap();
        let fields: Vec<_> = result.errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec![ValidationField::Name, ValidationField::Author]);
    }

    #[test]
    fn test_terminal_error_only_when_both_axes_inverted() {
        let dir = tempfile::tempdir().unwrap();
        let validator = Validator::default();
        let base = request(dir.path(), "a.jpg", 960, 800);

        let both = base.clone().with_terminal(TerminalRange::new(800, 400, 600, 300));
        assert!(validator
            .validate_single(&both)
            .unwrap()
            .has_field(ValidationField::Terminal));

        let width_only = base.clone().with_terminal(TerminalRange::new(800, 400, 300, 600));
        assert!(validator.validate_single(&width_only).unwrap().is_empty());

        let unbounded = base.with_terminal(TerminalRange::default());
        assert!(validator.validate_single(&unbounded).unwrap().is_empty());
    }

    #[test]
    fn test_legacy_format_check_only_accepts_jpg() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = Validator::new(960, 800, FormatCheck::Legacy);

        let jpg = request(dir.path(), "a.jpg", 960, 800);
        assert!(legacy.validate_single(&jpg).unwrap().is_empty());

        for name in ["b.jpeg", "c.png"] {
            let result = legacy
                .validate_single(&request(dir.path(), name, 960, 800))
                .unwrap();
            assert_eq!(result.len(), 1, "{}", name);
        }
    }

    #[test]
    fn test_validate_batch() {
        let dir = tempfile::tempdir().unwrap();
        let validator = Validator::default();

        assert!(validator
            .validate_batch(None)
            .unwrap()
            .has_field(ValidationField::File));

        let zip = dir.path().join("set");
        std::fs::write(&zip, b"PK\x03\x04").unwrap();
        assert!(validator
            .validate_batch(Some(&UploadFile::new(&zip, "Set.ZIP")))
            .unwrap()
            .is_empty());
        assert_eq!(
            validator
                .validate_batch(Some(&UploadFile::new(&zip, "set.rar")))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_extracted_set_accumulates_every_problem() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "a_ok.jpg", 960, 800, ImageFormat::Jpeg);
        write_image(dir.path(), "b_small.png", 100, 100, ImageFormat::Png);
        std::fs::write(dir.path().join("c_notes.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("d_subdir")).unwrap();

        let result = Validator::default()
            .validate_extracted_set(dir.path())
            .unwrap();
        let messages: Vec<&str> = result.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "b_small.png: image must be 960x800",
                "c_notes.txt: unsupported file format",
                "c_notes.txt: image must be 960x800",
            ]
        );
        assert!(result.errors().iter().all(|e| e.field == ValidationField::File));
    }

    #[test]
    fn test_extracted_set_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Validator::default()
            .validate_extracted_set(&dir.path().join("missing"))
            .is_err());
    }
}
