//! Unpacking of .pptx archives to disk.

use deck_core::{Error, Result};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Extract a .pptx archive into `dest_root/<file stem>` and return that path.
///
/// Existing files are overwritten, so extracting the same file twice into
/// the same root is safe.
pub fn extract_archive(file: &Path, dest_root: &Path) -> Result<PathBuf> {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("presentation");
    let output = dest_root.join(stem);

    fs::create_dir_all(&output)?;

    let reader = BufReader::new(File::open(file)?);
    let mut archive = ZipArchive::new(reader)
        .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

    archive
        .extract(&output)
        .map_err(|e| Error::ZipError(format!("Failed to extract {}: {}", file.display(), e)))?;

    log::info!(
        "[Success] Extracted {} to {}",
        file.display(),
        output.display()
    );

    Ok(output)
}
