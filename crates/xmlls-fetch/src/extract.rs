//! Blocking installation steps, run on the blocking pool.

use std::path::Path;

use tempfile::NamedTempFile;
use xmlls_core::{Result, XmlLsError};
use zip::ZipArchive;

/// Permission bits given to an installed server binary
#[cfg(unix)]
const BINARY_MODE: u32 = 0o766;

/// Create an empty temporary file next to `target`
pub(crate) fn staging_file(target: &Path, suffix: &str) -> Result<NamedTempFile> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    tempfile::Builder::new()
        .prefix(".xmlls-download-")
        .suffix(suffix)
        .tempfile_in(dir)
        .map_err(|e| XmlLsError::io(dir, e))
}

/// Extract the only entry of `archive` to `target`.
///
/// The entry count is checked before anything is written; an archive with
/// any other number of entries leaves `target` untouched. The archive is
/// deleted when it goes out of scope.
pub(crate) fn install_from_zip(archive: NamedTempFile, target: &Path) -> Result<()> {
    let file = archive
        .reopen()
        .map_err(|e| XmlLsError::io(archive.path(), e))?;
    let mut zip = ZipArchive::new(file)
        .map_err(|e| XmlLsError::Download(format!("invalid zip archive: {e}")))?;

    if zip.len() != 1 {
        return Err(XmlLsError::TooManyEntries { count: zip.len() });
    }

    let mut entry = zip
        .by_index(0)
        .map_err(|e| XmlLsError::Download(format!("unreadable zip entry: {e}")))?;
    tracing::debug!(entry = entry.name(), size = entry.size(), "extracting server binary");

    let mut staged = staging_file(target, "")?;
    std::io::copy(&mut entry, staged.as_file_mut()).map_err(|e| XmlLsError::io(staged.path(), e))?;
    install(staged, target)
}

/// Move a fully written staging file into place and mark it executable
pub(crate) fn install(staged: NamedTempFile, target: &Path) -> Result<()> {
    staged
        .as_file()
        .sync_all()
        .map_err(|e| XmlLsError::io(staged.path(), e))?;
    staged
        .persist(target)
        .map_err(|e| XmlLsError::io(target, e.error))?;
    mark_executable(target)
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(BINARY_MODE))
        .map_err(|e| XmlLsError::io(path, e))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}
