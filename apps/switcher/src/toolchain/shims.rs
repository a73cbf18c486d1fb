//! Command shims in `bin/`.
//!
//! Each shim is a small POSIX shell script that forwards to
//! `switcher exec <tool>`, so the active version is resolved from the
//! caller's working directory on every invocation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::paths::{GO_TOOLS, GOLANGCI_LINT};
use super::SwitcherPaths;
use crate::fsutil;

/// Name of the switcher executable installed next to the shims.
pub const SWITCHER_BINARY: &str = "switcher";

/// Tools that get a shim.
#[must_use]
pub fn shim_tools() -> [&'static str; 3] {
    [GO_TOOLS[0], GO_TOOLS[1], GOLANGCI_LINT]
}

/// Renders the shell script for `tool`.
#[must_use]
pub fn shim_script(tool: &str) -> String {
    format!(
        r#"#!/usr/bin/env sh
set -eu

switcher_bin="$(dirname "$0")/{SWITCHER_BINARY}"

if [ ! -x "$switcher_bin" ]; then
  echo "switcher binary not found at $switcher_bin" >&2
  echo "Run 'switcher use <version>' once to bootstrap shims." >&2
  exit 1
fi

exec "$switcher_bin" exec {tool} "$@"
"#
    )
}

/// Writes every shim, and installs `self_binary` into `bin/` when given.
///
/// # Errors
///
/// Returns an error if the layout cannot be created or any file cannot be
/// written.
pub fn ensure_shims(paths: &SwitcherPaths, self_binary: Option<&Path>) -> Result<()> {
    paths.ensure_layout()?;

    if let Some(source) = self_binary {
        install_switcher_binary(source, &paths.bin.join(SWITCHER_BINARY))?;
    }

    for tool in shim_tools() {
        let shim = paths.bin.join(tool);
        fsutil::write_atomic(&shim, shim_script(tool).as_bytes(), 0o755)
            .with_context(|| format!("Failed to write shim {}", shim.display()))?;
    }
    tracing::debug!(bin = %paths.bin.display(), "shims refreshed");
    Ok(())
}

/// Copies the running executable to `target` unless both are the same file.
fn install_switcher_binary(source: &Path, target: &Path) -> Result<()> {
    let source = fs::canonicalize(source).unwrap_or_else(|_| source.to_path_buf());
    if same_file(&source, target) {
        return Ok(());
    }

    let mut reader = fs::File::open(&source)
        .with_context(|| format!("Failed to open executable {}", source.display()))?;
    let mut tmp = fsutil::temp_file_beside(target)?;
    io::copy(&mut reader, &mut tmp)
        .with_context(|| format!("Failed to copy executable to {}", target.display()))?;
    fsutil::persist_temp(tmp, target, 0o755)?;
    tracing::info!(target = %target.display(), "installed switcher binary");
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Whether the shims directory is reachable through `PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathHint {
    pub bin_dir: PathBuf,
    pub on_path: bool,
}

/// Checks the current `PATH` for the shims directory.
#[must_use]
pub fn path_hint(paths: &SwitcherPaths) -> PathHint {
    let path_var = std::env::var_os("PATH");
    PathHint {
        bin_dir: paths.bin.clone(),
        on_path: paths.bin_on_path(path_var.as_deref()),
    }
}
