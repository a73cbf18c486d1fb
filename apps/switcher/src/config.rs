//! Persisted state in `config.json`.
//!
//! ```json
//! {
//!   "global_version": "go1.24.2",
//!   "golangci_lint_by_go": {
//!     "go1.24.2": "v1.64.8"
//!   }
//! }
//! ```
//!
//! Both keys are omitted when empty. Every write replaces the file
//! atomically, so readers never observe a partial document.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::fsutil;
use crate::toolchain::SwitcherPaths;
use crate::version::GoVersion;

/// The state document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Version used when no pin file applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_version: Option<GoVersion>,
    /// golangci-lint version chosen for each toolchain.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub golangci_lint_by_go: BTreeMap<GoVersion, String>,
}

/// Reads `config.json`, returning the default document if it does not exist.
///
/// # Errors
///
/// Returns an error naming the file if it cannot be read or decoded.
pub fn read_config(paths: &SwitcherPaths) -> Result<Config> {
    let path = &paths.config_file;
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read config {}", path.display()));
        }
    };
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to decode config {}", path.display()))
}

/// Writes `config` as indented JSON with a trailing newline.
///
/// # Errors
///
/// Returns an error if encoding or the atomic replace fails.
pub fn write_config(paths: &SwitcherPaths, config: &Config) -> Result<()> {
    paths.ensure_layout()?;
    let mut encoded = serde_json::to_vec_pretty(config).context("Failed to encode config")?;
    encoded.push(b'\n');
    fsutil::write_atomic(&paths.config_file, &encoded, 0o644).with_context(|| {
        format!("Failed to write config {}", paths.config_file.display())
    })
}

/// Applies `change` to the stored document and writes it back.
///
/// # Errors
///
/// Returns read, write, or `change` errors. Nothing is written if `change`
/// fails.
pub fn update_config<T>(
    paths: &SwitcherPaths,
    change: impl FnOnce(&mut Config) -> Result<T>,
) -> Result<T> {
    let mut config = read_config(paths)?;
    let out = change(&mut config)?;
    write_config(paths, &config)?;
    Ok(out)
}
