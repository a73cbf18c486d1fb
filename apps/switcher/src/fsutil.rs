//! Write-to-temp-then-rename helpers.
//!
//! Every file switcher persists (config, pin files, shims, cached archives,
//! installed executables) goes through this module. The temporary file is
//! created in the destination's directory so the final `rename` stays on one
//! filesystem and is atomic: a concurrent reader sees either the old file or
//! the new one in full. On any failure the temporary file is removed.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Prefix of temporary files created next to their destination.
pub const TEMP_PREFIX: &str = ".tmp-";

/// Atomically replaces `path` with `content`, setting `mode` on Unix.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, or if the
/// temporary file cannot be created, written, flushed, or renamed.
pub fn write_atomic(path: &Path, content: &[u8], mode: u32) -> Result<()> {
    let mut tmp = temp_file_beside(path)?;
    tmp.write_all(content)
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
    persist_temp(tmp, path, mode)
}

/// Creates an empty temporary file in the directory that will hold `path`.
///
/// The file is deleted when the handle is dropped unless it is promoted with
/// [`persist_temp`].
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be
/// created.
pub fn temp_file_beside(path: &Path) -> Result<NamedTempFile> {
    let parent = parent_dir(path);
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))
}

/// Flushes `tmp`, applies `mode`, and renames it over `path`.
///
/// # Errors
///
/// Returns an error if syncing, setting permissions, or renaming fails. The
/// temporary file is removed in every error case.
pub fn persist_temp(tmp: NamedTempFile, path: &Path, mode: u32) -> Result<()> {
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush temp file for {}", path.display()))?;
    set_mode(tmp.path(), mode)?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file into {}", path.display()))?;
    Ok(())
}

/// Removes `path` if it exists.
///
/// # Errors
///
/// Returns an error for any failure other than the file being absent.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
