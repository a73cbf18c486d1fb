//! Safe extraction of gzip tarballs.
//!
//! Go release archives keep everything under a top-level `go/` directory.
//! [`extract_toolchain`] strips that prefix and unpacks into a temporary
//! sibling of the target, which is only renamed into place after every
//! entry was written and `bin/go` is present. Entries that would land
//! outside the extraction root, either lexically (`..`, absolute paths) or
//! through a previously extracted symlink, abort the extraction.
//!
//! [`extract_binary`] pulls a single executable out of a tool archive.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use crate::errors::SwitcherError;
use crate::fsutil;

/// Top-level directory of every Go release archive.
const GO_ROOT: &str = "go";

/// Prefix of the temporary extraction directory.
const TEMP_TOOLCHAIN_PREFIX: &str = ".tmp-toolchain-";

fn open_archive(archive_path: &Path) -> Result<Archive<GzDecoder<fs::File>>> {
    let file = fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    Ok(Archive::new(GzDecoder::new(file)))
}

/// Extracts a Go release archive into `target_dir`.
///
/// An existing `target_dir` is replaced only once the new tree is complete.
///
/// # Errors
///
/// Returns [`SwitcherError::UnsafeArchivePath`] or
/// [`SwitcherError::UnexpectedArchiveRoot`] for rejected entries,
/// [`SwitcherError::CorruptInstall`] if `bin/go` is missing afterwards, and
/// I/O errors for unreadable archives or failed writes. On error nothing is
/// left at `target_dir` beyond what was there before, and no temporary
/// directory remains.
pub fn extract_toolchain(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let parent = target_dir
        .parent()
        .with_context(|| format!("Invalid toolchain directory: {}", target_dir.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let staging = tempfile::Builder::new()
        .prefix(TEMP_TOOLCHAIN_PREFIX)
        .tempdir_in(parent)
        .with_context(|| format!("Failed to create temp directory in {}", parent.display()))?;
    let root = staging.path();

    let mut archive = open_archive(archive_path)?;
    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let mut entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;
        let raw_path = entry.path().context("Failed to get entry path")?.into_owned();

        let Some(relative) = strip_go_root(&raw_path)? else {
            continue;
        };
        reject_symlinked_ancestors(root, &relative, &raw_path)?;
        let output = root.join(&relative);

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&output).with_context(|| {
                    format!("Failed to create directory: {}", output.display())
                })?;
            }
            EntryType::Regular | EntryType::Continuous => {
                create_parent(&output)?;
                entry
                    .unpack(&output)
                    .with_context(|| format!("Failed to extract: {}", output.display()))?;
            }
            EntryType::Symlink => {
                let link = entry
                    .link_name()
                    .context("Failed to read symlink target")?
                    .with_context(|| format!("Symlink without target: {}", raw_path.display()))?
                    .into_owned();
                create_parent(&output)?;
                make_symlink(&link, &output)?;
            }
            other => {
                tracing::debug!(
                    entry = %raw_path.display(),
                    kind = ?other,
                    "skipping archive entry"
                );
            }
        }
    }

    let go_binary = root.join("bin").join("go");
    if !go_binary.is_file() {
        let version = target_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(SwitcherError::CorruptInstall {
            version,
            missing: "bin/go".to_string(),
        }
        .into());
    }

    if target_dir.exists() {
        fs::remove_dir_all(target_dir).with_context(|| {
            format!(
                "Failed to remove existing toolchain: {}",
                target_dir.display()
            )
        })?;
    }
    fs::rename(root, target_dir).with_context(|| {
        format!(
            "Failed to move extracted toolchain into {}",
            target_dir.display()
        )
    })?;

    Ok(())
}

/// Extracts the first regular entry named `binary_name` to `destination`.
///
/// The file is written next to `destination`, marked `0755`, and renamed
/// into place.
///
/// # Errors
///
/// Returns [`SwitcherError::BinaryNotInArchive`] if no entry matches, or an
/// I/O error if reading or writing fails.
pub fn extract_binary(archive_path: &Path, destination: &Path, binary_name: &str) -> Result<()> {
    let mut archive = open_archive(archive_path)?;
    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let mut entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path().context("Failed to get entry path")?;
        if path.file_name().and_then(|n| n.to_str()) != Some(binary_name) {
            continue;
        }

        let mut tmp = fsutil::temp_file_beside(destination)?;
        io::copy(&mut entry, &mut tmp)
            .with_context(|| format!("Failed to write {}", destination.display()))?;
        return fsutil::persist_temp(tmp, destination, 0o755);
    }

    Err(SwitcherError::BinaryNotInArchive {
        name: binary_name.to_string(),
    }
    .into())
}

/// Cleans `raw` lexically and removes the leading `go/` component.
///
/// Returns `None` for the root directory entry itself.
fn strip_go_root(raw: &Path) -> Result<Option<PathBuf>, SwitcherError> {
    let display = raw.to_string_lossy();
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(SwitcherError::unsafe_archive_path(display));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(SwitcherError::unsafe_archive_path(display));
            }
        }
    }

    match parts.split_first() {
        None => Ok(None),
        Some((first, _)) if *first != GO_ROOT => Err(SwitcherError::UnexpectedArchiveRoot {
            entry: display.into_owned(),
        }),
        Some((_, [])) => Ok(None),
        Some((_, rest)) => Ok(Some(rest.iter().collect())),
    }
}

/// Fails if `relative` or any of its ancestors under `root` is a symlink.
fn reject_symlinked_ancestors(root: &Path, relative: &Path, raw: &Path) -> Result<()> {
    let mut current = root.to_path_buf();
    for component in relative.components() {
        current.push(component);
        if fs::symlink_metadata(&current).is_ok_and(|m| m.file_type().is_symlink()) {
            return Err(SwitcherError::unsafe_archive_path(raw.to_string_lossy()).into());
        }
    }
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link).with_context(|| {
        format!(
            "Failed to create symlink {} -> {}",
            link.display(),
            target.display()
        )
    })
}

#[cfg(not(unix))]
fn make_symlink(_target: &Path, link: &Path) -> Result<()> {
    tracing::debug!(link = %link.display(), "symlinks unsupported, skipping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Entry, go_archive, tar_gz, write};
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn archive_file(dir: &Path, bytes: &[u8]) -> PathBuf {
        let path = dir.join("archive.tar.gz");
        write(&path, bytes);
        path
    }

    /// Builds a tarball with a raw entry name, bypassing the builder's own
    /// path validation.
    fn raw_entry_archive(name: &str, content: &[u8]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        let mut header = tar::Header::new_old();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_entry_type(EntryType::Regular);
        header.set_mode(0o644);
        header.set_size(content.len() as u64);
        header.set_cksum();
        builder.append(&header, content).expect("Should append raw entry");
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn staging_dirs(parent: &Path) -> Vec<String> {
        fs::read_dir(parent)
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(TEMP_TOOLCHAIN_PREFIX))
            .collect()
    }

    #[test]
    fn extracts_go_tree_without_root_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive_file(dir.path(), &go_archive("go1.24.0"));
        let target = dir.path().join("toolchains").join("go1.24.0");

        extract_toolchain(&archive, &target).expect("Should extract");

        assert!(target.join("bin/go").is_file());
        assert!(target.join("bin/gofmt").is_file());
        assert_eq!(
            fs::read_to_string(target.join("VERSION")).unwrap(),
            "go1.24.0\n"
        );
        #[cfg(unix)]
        assert_eq!(
            fs::read_link(target.join("bin/go-alias")).unwrap(),
            PathBuf::from("go")
        );
        assert!(staging_dirs(&dir.path().join("toolchains")).is_empty());
    }

    #[test]
    fn replaces_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive_file(dir.path(), &go_archive("go1.24.0"));
        let target = dir.path().join("toolchains").join("go1.24.0");
        write(&target.join("stale.txt"), b"old");

        extract_toolchain(&archive, &target).expect("Should extract");

        assert!(!target.join("stale.txt").exists());
        assert!(target.join("bin/go").is_file());
    }

    #[test]
    fn rejects_parent_dir_escape() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive_file(dir.path(), &raw_entry_archive("../../etc/passwd", b"pwned"));
        let toolchains = dir.path().join("home").join("toolchains");
        let target = toolchains.join("go1.24.0");

        let err = extract_toolchain(&archive, &target).unwrap_err();

        assert!(matches!(
            SwitcherError::find(&err),
            Some(SwitcherError::UnsafeArchivePath { .. })
        ));
        assert!(!target.exists());
        assert!(!dir.path().join("etc").exists());
        assert!(!dir.path().join("home").join("etc").exists());
        assert!(staging_dirs(&toolchains).is_empty());
    }

    #[test]
    fn rejects_absolute_entry() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive_file(dir.path(), &raw_entry_archive("/go/bin/go", b"x"));
        let target = dir.path().join("toolchains").join("go1.24.0");

        let err = extract_toolchain(&archive, &target).unwrap_err();

        assert!(matches!(
            SwitcherError::find(&err),
            Some(SwitcherError::UnsafeArchivePath { .. })
        ));
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn rejects_writes_through_extracted_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        let outside_str = outside.to_string_lossy().into_owned();
        let archive = archive_file(
            dir.path(),
            &tar_gz(&[
                Entry::Dir("go/"),
                Entry::Symlink("go/evil", &outside_str),
                Entry::File("go/evil/pwned", b"x", 0o644),
            ]),
        );
        let target = dir.path().join("toolchains").join("go1.24.0");

        let err = extract_toolchain(&archive, &target).unwrap_err();

        assert!(matches!(
            SwitcherError::find(&err),
            Some(SwitcherError::UnsafeArchivePath { .. })
        ));
        assert!(!outside.join("pwned").exists());
        assert!(!target.exists());
    }

    #[test]
    fn rejects_foreign_root() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive_file(
            dir.path(),
            &tar_gz(&[Entry::File("golang/bin/go", b"x", 0o755)]),
        );
        let target = dir.path().join("toolchains").join("go1.24.0");

        let err = extract_toolchain(&archive, &target).unwrap_err();

        assert!(matches!(
            SwitcherError::find(&err),
            Some(SwitcherError::UnexpectedArchiveRoot { .. })
        ));
        assert!(!target.exists());
    }

    #[test]
    fn missing_go_binary_is_corrupt_install() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive_file(
            dir.path(),
            &tar_gz(&[Entry::File("go/VERSION", b"go1.24.0\n", 0o644)]),
        );
        let target = dir.path().join("toolchains").join("go1.24.0");

        let err = extract_toolchain(&archive, &target).unwrap_err();

        match SwitcherError::find(&err) {
            Some(SwitcherError::CorruptInstall { version, missing }) => {
                assert_eq!(version, "go1.24.0");
                assert_eq!(missing, "bin/go");
            }
            other => panic!("Expected CorruptInstall, got {other:?}"),
        }
        assert!(!target.exists());
        assert!(staging_dirs(&dir.path().join("toolchains")).is_empty());
    }

    #[test]
    fn strip_go_root_cleans_paths() {
        assert_eq!(strip_go_root(Path::new("go/")).unwrap(), None);
        assert_eq!(
            strip_go_root(Path::new("./go/bin/../bin/go")).unwrap(),
            Some(PathBuf::from("bin/go"))
        );
        assert!(strip_go_root(Path::new("go/../../x")).is_err());
    }

    #[test]
    fn extract_binary_installs_executable() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive_file(
            dir.path(),
            &tar_gz(&[
                Entry::File("golangci-lint-1.64.8-linux-amd64/README.md", b"doc", 0o644),
                Entry::File(
                    "golangci-lint-1.64.8-linux-amd64/golangci-lint",
                    b"#!/bin/sh\n",
                    0o644,
                ),
            ]),
        );
        let dest = dir.path().join("tools").join("golangci-lint");

        extract_binary(&archive, &dest, "golangci-lint").expect("Should extract binary");

        assert_eq!(fs::read(&dest).unwrap(), b"#!/bin/sh\n");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&dest).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn extract_binary_reports_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive_file(
            dir.path(),
            &tar_gz(&[Entry::File("pkg/golangci-lint.txt", b"x", 0o644)]),
        );
        let dest = dir.path().join("golangci-lint");

        let err = extract_binary(&archive, &dest, "golangci-lint").unwrap_err();

        assert!(matches!(
            SwitcherError::find(&err),
            Some(SwitcherError::BinaryNotInArchive { .. })
        ));
        assert!(!dest.exists());
    }
}
