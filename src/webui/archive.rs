//! Unpacking release archives.

use crate::core::{Result, WebUiError};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Extract the zip archive at `archive` into `target`, creating `target`
/// if needed. Returns the number of files written.
///
/// Entries whose names would escape `target` (absolute paths, `..`) are
/// rejected. Runs on the blocking pool.
///
/// # Errors
///
/// [`WebUiError::Extraction`] if the archive is unreadable or corrupt, or if
/// any entry cannot be written.
pub async fn extract_zip(archive: &Path, target: &Path) -> Result<usize> {
    let archive = archive.to_path_buf();
    let target = target.to_path_buf();

    tokio::task::spawn_blocking(move || extract_zip_blocking(&archive, &target))
        .await
        .map_err(|e| WebUiError::Io(io::Error::other(e)))?
}

fn extract_zip_blocking(archive: &Path, target: &Path) -> Result<usize> {
    info!("Extracting {} into {}", archive.display(), target.display());

    let fail = |reason: String| WebUiError::Extraction {
        archive: archive.display().to_string(),
        reason,
    };

    fs::create_dir_all(target)
        .map_err(|e| fail(format!("cannot create {}: {e}", target.display())))?;

    let file = File::open(archive).map_err(|e| fail(format!("cannot open archive: {e}")))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| fail(e.to_string()))?;

    let mut written = 0;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| fail(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(fail(format!("unsafe entry name '{}'", entry.name())));
        };
        let out_path = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|e| fail(format!("cannot create {}: {e}", out_path.display())))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| fail(format!("cannot create {}: {e}", parent.display())))?;
        }

        let mut out = File::create(&out_path)
            .map_err(|e| fail(format!("cannot create {}: {e}", out_path.display())))?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| fail(format!("cannot write {}: {e}", out_path.display())))?;

        written += 1;
    }

    debug!(files = written, "Extraction finished");
    Ok(written)
}
