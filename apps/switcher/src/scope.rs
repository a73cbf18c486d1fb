//! Active version resolution.
//!
//! A `.switcher-version` file in the working directory or any ancestor pins
//! the toolchain for that tree. Without one, the `global_version` from
//! `config.json` applies. A local pin always wins over the global version.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::config::{read_config, update_config};
use crate::errors::SwitcherError;
use crate::fsutil;
use crate::toolchain::SwitcherPaths;
use crate::version::GoVersion;

/// Name of the per-directory pin file.
pub const LOCAL_VERSION_FILE: &str = ".switcher-version";

/// Where an active version comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Global,
    Local,
}

impl FromStr for Scope {
    type Err = SwitcherError;

    /// Accepts `global`, `local`, or an empty string (global), ignoring case.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "" | "global" => Ok(Self::Global),
            "local" => Ok(Self::Local),
            _ => Err(SwitcherError::InvalidScope {
                input: input.to_string(),
            }),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Global => "global",
            Self::Local => "local",
        })
    }
}

/// The resolved version together with the file it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveVersion {
    pub version: GoVersion,
    pub scope: Scope,
    /// The pin file for local scope, `config.json` for global scope.
    pub source: PathBuf,
}

/// Walks from `start` up to the filesystem root looking for a pin file.
///
/// If `start` names a file the search begins in its directory.
///
/// # Errors
///
/// Returns an error naming the pin file if it cannot be read or does not
/// contain a valid version.
pub fn find_local_version(start: &Path) -> Result<Option<(GoVersion, PathBuf)>> {
    let absolute = std::path::absolute(start)
        .map(|path| clean_path(&path))
        .with_context(|| format!("Failed to resolve absolute path from {}", start.display()))?;
    let mut current = if absolute.is_file() {
        absolute
            .parent()
            .map_or_else(|| absolute.clone(), Path::to_path_buf)
    } else {
        absolute
    };

    loop {
        let candidate = current.join(LOCAL_VERSION_FILE);
        match std::fs::read_to_string(&candidate) {
            Ok(raw) => {
                let version = raw.parse::<GoVersion>().with_context(|| {
                    format!("Invalid local version in {}", candidate.display())
                })?;
                return Ok(Some((version, candidate)));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read local version file {}", candidate.display())
                });
            }
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent.to_path_buf(),
            _ => return Ok(None),
        }
    }
}

/// Removes `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root.
fn clean_path(path: &Path) -> PathBuf {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other),
        }
    }
    clean
}

/// Resolves the active version for `cwd`.
///
/// # Errors
///
/// Returns [`SwitcherError::NoActiveVersion`] when neither a pin file nor a
/// global version exists, and read/decode errors otherwise.
pub fn resolve_active_version(cwd: &Path, paths: &SwitcherPaths) -> Result<ActiveVersion> {
    if let Some((version, source)) = find_local_version(cwd)? {
        return Ok(ActiveVersion {
            version,
            scope: Scope::Local,
            source,
        });
    }

    match global_version(paths)? {
        Some(version) => Ok(ActiveVersion {
            version,
            scope: Scope::Global,
            source: paths.config_file.clone(),
        }),
        None => Err(SwitcherError::NoActiveVersion.into()),
    }
}

/// Activates `version` for `scope`.
///
/// Local scope writes the pin file in exactly `cwd`, never in an ancestor.
///
/// # Errors
///
/// Returns an error if the pin file or config cannot be written.
pub fn set_active_version(
    version: GoVersion,
    scope: Scope,
    cwd: &Path,
    paths: &SwitcherPaths,
) -> Result<()> {
    match scope {
        Scope::Local => set_local_version_at(&cwd.join(LOCAL_VERSION_FILE), version),
        Scope::Global => set_global_version(paths, version),
    }
}

/// Writes `version` into the pin file at `pin_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn set_local_version_at(pin_path: &Path, version: GoVersion) -> Result<()> {
    fsutil::write_atomic(pin_path, format!("{version}\n").as_bytes(), 0o644)
        .with_context(|| format!("Failed to write local version file {}", pin_path.display()))
}

/// Removes the pin file at `pin_path`. A missing file is not an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_local_version_at(pin_path: &Path) -> Result<()> {
    fsutil::remove_file_if_exists(pin_path)
}

/// Returns the configured global version, if any.
///
/// # Errors
///
/// Returns an error if the config cannot be read.
pub fn global_version(paths: &SwitcherPaths) -> Result<Option<GoVersion>> {
    Ok(read_config(paths)?.global_version)
}

/// Sets the global version in `config.json`.
///
/// # Errors
///
/// Returns an error if the config cannot be read or written.
pub fn set_global_version(paths: &SwitcherPaths, version: GoVersion) -> Result<()> {
    update_config(paths, |config| {
        config.global_version = Some(version);
        Ok(())
    })
}

/// Removes the global version from `config.json`.
///
/// # Errors
///
/// Returns an error if the config cannot be read or written.
pub fn clear_global_version(paths: &SwitcherPaths) -> Result<()> {
    update_config(paths, |config| {
        config.global_version = None;
        Ok(())
    })
}
