//! Downloadable wallpaper packages and batch upload extraction.

use crate::workspace::{reserve_path, DerivedFile};
use muralis_core::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

/// Manifest stored as `info.json` next to the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveManifest {
    pub name: String,
    pub author: String,
    /// Entry name of the image inside the archive
    pub image: String,
}

pub const MANIFEST_ENTRY: &str = "info.json";
const IMAGE_ENTRY_STEM: &str = "wallpaper";

fn archive_error(context: &str, err: ZipError) -> AppError {
    AppError::Archive(format!("{}: {}", context, err))
}

/// Extract only the base name of an entry, dropping directory components.
fn sanitize_entry_name(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(str::to_string)
}

pub struct ArchiveBuilder;

impl ArchiveBuilder {
    /// Package `master` with its display metadata into a zip inside `out_dir`.
    pub fn build_archive(
        display_name: &str,
        author: &str,
        master: &DerivedFile,
        out_dir: &Path,
    ) -> Result<DerivedFile, AppError> {
        let extension = Path::new(&master.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| "jpg".to_string());
        let image_entry = format!("{}.{}", IMAGE_ENTRY_STEM, extension);

        let manifest = ArchiveManifest {
            name: display_name.to_string(),
            author: author.to_string(),
            image: image_entry.clone(),
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest)?;

        let path = reserve_path(out_dir, "archive_", "zip")?;
        let mut zip = ZipWriter::new(BufWriter::new(File::create(&path)?));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        zip.start_file(image_entry.as_str(), options)
            .map_err(|e| archive_error("Failed to add image to archive", e))?;
        let mut source = BufReader::new(File::open(&master.path)?);
        io::copy(&mut source, &mut zip)?;

        zip.start_file(MANIFEST_ENTRY, options)
            .map_err(|e| archive_error("Failed to add manifest to archive", e))?;
        zip.write_all(&manifest_json)?;

        let mut writer = zip
            .finish()
            .map_err(|e| archive_error("Failed to finalize archive", e))?;
        writer.flush()?;

        tracing::debug!(
            path = %path.display(),
            image_entry = %image_entry,
            "Built wallpaper archive"
        );

        Ok(DerivedFile::new(path, "wallpaper.zip"))
    }
}

/// Unpack every regular file of `zip_path` directly into `out_dir`.
///
/// Entry names are flattened to their base name; directories are skipped and
/// a repeated base name gets a numeric prefix. Returns the written paths
/// sorted by name.
pub fn extract_archive(zip_path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| archive_error("Failed to open zip upload", e))?;

    let mut seen = HashSet::new();
    let mut written = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| archive_error("Failed to read zip entry", e))?;
        if entry.is_dir() {
            continue;
        }

        let Some(base_name) = sanitize_entry_name(entry.name()) else {
            tracing::warn!(entry = %entry.name(), "Skipping zip entry without a usable name");
            continue;
        };
        let file_name = if seen.insert(base_name.clone()) {
            base_name
        } else {
            let renamed = format!("{}_{}", index, base_name);
            seen.insert(renamed.clone());
            renamed
        };

        let target = out_dir.join(&file_name);
        let mut out = BufWriter::new(File::create(&target)?);
        io::copy(&mut entry, &mut out)?;
        out.flush()?;
        written.push(target);
    }

    written.sort();
    Ok(written)
}
