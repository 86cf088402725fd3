//! Upload request models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// A file received from a client.
///
/// `path` is where the bytes live on disk (usually a multipart temp file with
/// a random name); `file_name` is the name the client declared, which carries
/// the extension used for format checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    pub path: PathBuf,
    pub file_name: String,
}

impl UploadFile {
    pub fn new(path: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_name: file_name.into(),
        }
    }

    /// Use the on-disk file name as the declared name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, file_name }
    }

    /// Lowercased extension of the declared file name, if any.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

/// Range of terminal screen sizes an asset is declared compatible with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerminalRange {
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl TerminalRange {
    pub fn new(min_width: u32, max_width: u32, min_height: u32, max_height: u32) -> Self {
        Self {
            min_width,
            max_width,
            min_height,
            max_height,
        }
    }

    /// Only an inversion on both axes is treated as incoherent.
    pub fn is_inverted(&self) -> bool {
        self.max_width < self.min_width && self.max_height < self.min_height
    }

    /// A range with positive upper bounds on both axes. Unbounded ranges are
    /// not recorded on the asset.
    pub fn is_bounded(&self) -> bool {
        self.max_width > 0 && self.max_height > 0
    }
}

/// Raw single-image upload, before validation.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file: Option<UploadFile>,
    pub name: String,
    pub author: String,
    pub categories: BTreeSet<String>,
    pub terminal: Option<TerminalRange>,
    /// Launcher packages the asset targets; empty means the configured default.
    pub target_packages: BTreeSet<String>,
}

impl UploadRequest {
    pub fn new(file: UploadFile, name: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            file: Some(file),
            name: name.into(),
            author: author.into(),
            ..Default::default()
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_terminal(mut self, terminal: TerminalRange) -> Self {
        self.terminal = Some(terminal);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lowercased() {
        let file = UploadFile::new("/tmp/upload-1234", "Sunset.JPG");
        assert_eq!(file.extension().as_deref(), Some("jpg"));

        let file = UploadFile::new("/tmp/upload-1234", "noextension");
        assert_eq!(file.extension(), None);
    }

    #[test]
    fn test_terminal_range_inversion_needs_both_axes() {
        assert!(TerminalRange::new(10, 5, 10, 5).is_inverted());
        assert!(!TerminalRange::new(10, 5, 1, 5).is_inverted());
        assert!(!TerminalRange::new(1, 5, 10, 5).is_inverted());
    }

    #[test]
    fn test_terminal_range_bounded() {
        assert!(TerminalRange::new(0, 1080, 0, 1920).is_bounded());
        assert!(!TerminalRange::new(0, 0, 0, 1920).is_bounded());
        assert!(!TerminalRange::default().is_bounded());
    }
}
