//! Path management for switcher.
//!
//! The default root directory is `~/.switcher/`, which can be overridden by
//! setting the `SWITCHER_HOME` environment variable.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.switcher/                 # Root directory (or SWITCHER_HOME)
//!   toolchains/                # Installed Go toolchains
//!     go1.24.2/
//!       bin/go                 # Presence marks the toolchain as installed
//!       bin/gofmt
//!   tools/                     # Companion tools
//!     golangci-lint/v1.64.8/linux-amd64/golangci-lint
//!   bin/                       # Shims and the switcher binary
//!   cache/                     # Verified release archives
//!   config.json                # Global version and companion pins
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::errors::SwitcherError;
use crate::toolchain::Platform;
use crate::version::GoVersion;

/// Environment variable to override the default root directory.
pub const SWITCHER_HOME_ENV: &str = "SWITCHER_HOME";

/// Name of the persisted state document.
const CONFIG_FILE: &str = "config.json";

/// Executables shipped inside a Go toolchain that switcher can dispatch to.
pub const GO_TOOLS: [&str; 2] = ["go", "gofmt"];

/// Directory name (and executable name) of the companion linter.
pub const GOLANGCI_LINT: &str = "golangci-lint";

/// Every directory and file switcher manages, derived from one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitcherPaths {
    /// Root directory (`~/.switcher` or `SWITCHER_HOME`).
    pub root: PathBuf,
    /// Installed toolchains, one directory per normalized version.
    pub toolchains: PathBuf,
    /// Installed companion tools.
    pub tools: PathBuf,
    /// Shims directory meant to be placed on `PATH`.
    pub bin: PathBuf,
    /// Download cache keyed by archive filename.
    pub cache: PathBuf,
    /// Location of `config.json`.
    pub config_file: PathBuf,
}

impl SwitcherPaths {
    /// Resolves the root from `SWITCHER_HOME`, falling back to `~/.switcher`.
    ///
    /// # Errors
    ///
    /// Returns an error if `SWITCHER_HOME` is unset and the home directory
    /// cannot be determined.
    pub fn from_env() -> Result<Self> {
        let root = match std::env::var_os(SWITCHER_HOME_ENV) {
            Some(home) if !home.is_empty() => PathBuf::from(home),
            _ => dirs::home_dir()
                .context("Cannot determine home directory. Set SWITCHER_HOME instead.")?
                .join(".switcher"),
        };
        Ok(Self::with_root(root))
    }

    /// Builds the layout under an explicit root.
    #[must_use = "returns new paths instance without side effects"]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            toolchains: root.join("toolchains"),
            tools: root.join("tools"),
            bin: root.join("bin"),
            cache: root.join("cache"),
            config_file: root.join(CONFIG_FILE),
            root,
        }
    }

    /// Creates every managed directory. Existing directories are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [
            &self.root,
            &self.toolchains,
            &self.tools,
            &self.bin,
            &self.cache,
        ] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    #[must_use = "returns the path without side effects"]
    pub fn toolchain_dir(&self, version: GoVersion) -> PathBuf {
        self.toolchains.join(version.to_string())
    }

    #[must_use = "returns the path without side effects"]
    pub fn go_binary_path(&self, version: GoVersion) -> PathBuf {
        self.toolchain_dir(version).join("bin").join("go")
    }

    /// Returns where a cached archive with this filename lives.
    #[must_use = "returns the path without side effects"]
    pub fn cache_path(&self, filename: &str) -> PathBuf {
        self.cache.join(filename)
    }

    /// Returns the install location of a golangci-lint release for `platform`.
    #[must_use = "returns the path without side effects"]
    pub fn golangci_lint_binary_path(&self, lint_version: &str, platform: Platform) -> PathBuf {
        self.tools
            .join(GOLANGCI_LINT)
            .join(lint_version)
            .join(platform.pair())
            .join(GOLANGCI_LINT)
    }

    /// Returns `true` when `bin/go` exists for `version`.
    #[must_use = "returns installation status without side effects"]
    pub fn toolchain_exists(&self, version: GoVersion) -> bool {
        self.go_binary_path(version).is_file()
    }

    /// Returns the path of `go` or `gofmt` inside an installed toolchain.
    ///
    /// # Errors
    ///
    /// Returns [`SwitcherError::UnsupportedTool`] for any other tool name, and
    /// an error if the executable does not exist.
    pub fn go_tool_binary(&self, version: GoVersion, tool: &str) -> Result<PathBuf> {
        if !GO_TOOLS.contains(&tool) {
            return Err(SwitcherError::UnsupportedTool {
                tool: tool.to_string(),
            }
            .into());
        }
        let binary = self.toolchain_dir(version).join("bin").join(tool);
        if !binary.is_file() {
            anyhow::bail!(
                "{tool} binary for {version} not found at {}",
                binary.display()
            );
        }
        Ok(binary)
    }

    /// Lists installed toolchains, newest first.
    ///
    /// Directories whose name does not normalize, or that lack `bin/go`, are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the toolchains directory cannot be read.
    pub fn list_installed_versions(&self) -> Result<Vec<GoVersion>> {
        self.ensure_layout()?;
        let entries = std::fs::read_dir(&self.toolchains).with_context(|| {
            format!(
                "Failed to read toolchains directory: {}",
                self.toolchains.display()
            )
        })?;

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            if !entry.path().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let Ok(version) = name.parse::<GoVersion>() else {
                continue;
            };
            if self.toolchain_exists(version) {
                versions.push(version);
            }
        }

        versions.sort_unstable_by(|a, b| b.cmp(a));
        versions.dedup();
        Ok(versions)
    }

    /// Removes an installed toolchain directory wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`SwitcherError::ToolchainNotFound`] if the version is not
    /// installed, or an error if removal fails.
    pub fn remove_toolchain(&self, version: GoVersion) -> Result<()> {
        let dir = self.toolchain_dir(version);
        if !self.toolchain_exists(version) {
            return Err(SwitcherError::ToolchainNotFound {
                version: version.to_string(),
            }
            .into());
        }
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to remove toolchain: {}", dir.display()))
    }

    /// Returns `true` if `bin/` is one of the entries of `path_var`.
    #[must_use]
    pub fn bin_on_path(&self, path_var: Option<&std::ffi::OsStr>) -> bool {
        path_var.is_some_and(|value| std::env::split_paths(value).any(|entry| entry == self.bin))
    }
}
