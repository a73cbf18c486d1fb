//! Platform detection for Go release archives.
//!
//! Go names platforms with `GOOS`/`GOARCH` values (`linux`/`amd64`,
//! `darwin`/`arm64`), which differ from Rust's `std::env::consts` names.
//! This module maps one onto the other so release metadata and companion
//! archive names can be matched against the running system.
//!
//! ## Supported Platforms
//!
//! - Linux: `amd64`, `arm64`, `386`, `armv6l`
//! - macOS (`darwin`): `amd64`, `arm64`

use anyhow::{Result, bail};
use std::fmt;

/// Operating system and architecture in Go's naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    /// `GOOS` value, e.g. `linux`.
    pub os: &'static str,
    /// `GOARCH` value, e.g. `amd64`.
    pub arch: &'static str,
}

impl Platform {
    /// Creates a platform from explicit Go names.
    #[must_use]
    pub const fn new(os: &'static str, arch: &'static str) -> Self {
        Self { os, arch }
    }

    /// Detects the current platform from compile-time configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the current OS/architecture combination has no
    /// Go release archives.
    pub fn detect() -> Result<Self> {
        Self::from_rust_names(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Maps Rust's `OS`/`ARCH` constants onto Go's names.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported combinations.
    pub fn from_rust_names(os: &str, arch: &str) -> Result<Self> {
        let go_os = match os {
            "linux" => "linux",
            "macos" => "darwin",
            _ => bail!("Unsupported operating system: {os}. Supported: linux, macos"),
        };
        let go_arch = match (go_os, arch) {
            (_, "x86_64") => "amd64",
            (_, "aarch64") => "arm64",
            ("linux", "x86") => "386",
            ("linux", "arm") => "armv6l",
            _ => bail!("Unsupported architecture {arch} on {os}"),
        };
        Ok(Self::new(go_os, go_arch))
    }

    /// Returns the `os-arch` pair used in directory and archive names.
    #[must_use]
    pub fn pair(self) -> String {
        format!("{}-{}", self.os, self.arch)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}
