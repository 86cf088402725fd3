//! Scoped scratch space for one pipeline run.

use muralis_core::models::UploadFile;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A file produced (or passed through) by a pipeline step.
///
/// `file_name` carries the extension used when naming the stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFile {
    pub path: PathBuf,
    pub file_name: String,
}

impl DerivedFile {
    pub fn new(path: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_name: file_name.into(),
        }
    }

    pub fn len(&self) -> io::Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl From<&UploadFile> for DerivedFile {
    fn from(file: &UploadFile) -> Self {
        Self::new(file.path.clone(), file.file_name.clone())
    }
}

/// Temporary directory owning every derived file of a run.
///
/// Dropping the workspace deletes the directory, so derived files are released
/// on every exit path of a run, including early failures.
#[derive(Debug)]
pub struct RunWorkspace {
    dir: TempDir,
}

impl RunWorkspace {
    pub fn new() -> io::Result<Self> {
        Self::new_in(None)
    }

    /// Create the workspace under `parent`, or the system temp dir when `None`.
    pub fn new_in(parent: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("muralis-run-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Reserve a fresh file name inside `dir`.
///
/// Concurrent steps writing the same logical size (cover and crop share
/// 120x100) each get their own file.
pub(crate) fn reserve_path(dir: &Path, stem: &str, extension: &str) -> io::Result<PathBuf> {
    let suffix = format!(".{}", extension);
    let (_, path) = tempfile::Builder::new()
        .prefix(stem)
        .suffix(&suffix)
        .tempfile_in(dir)?
        .keep()
        .map_err(|e| e.error)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_is_removed_on_drop() {
        let workspace = RunWorkspace::new().unwrap();
        let path = workspace.path().to_path_buf();
        std::fs::write(path.join("derived.jpg"), b"x").unwrap();
        assert!(path.exists());

        drop(workspace);
        assert!(!path.exists());
    }

    #[test]
    fn test_workspace_in_parent() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = RunWorkspace::new_in(Some(parent.path())).unwrap();
        assert!(workspace.path().starts_with(parent.path()));
        assert!(workspace
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("muralis-run-"));

        drop(workspace);
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_reserved_paths_are_unique() {
        let workspace = RunWorkspace::new().unwrap();
        let a = reserve_path(workspace.path(), "120x100_", "jpg").unwrap();
        let b = reserve_path(workspace.path(), "120x100_", "jpg").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with(workspace.path()));
        assert_eq!(a.extension().unwrap(), "jpg");
    }
}
