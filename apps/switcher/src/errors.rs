//! Error types for the switcher CLI.
//!
//! Most functions return `anyhow::Result` and attach context at each layer.
//! The root cause is a [`SwitcherError`] whenever the failure belongs to one
//! of the conditions callers need to tell apart: bad input, the "no active
//! version" resolution outcome, network failures, and integrity failures.
//! Use [`SwitcherError::find`] to recover it from an `anyhow::Error` chain.

use std::path::PathBuf;
use thiserror::Error;

/// Consolidated error type for switcher operations.
#[derive(Debug, Error)]
pub enum SwitcherError {
    /// A version string could not be normalized.
    #[error("invalid go version {input:?}")]
    InvalidVersion {
        /// The rejected input.
        input: String,
    },

    /// A dotted (companion tool) version could not be parsed.
    #[error("invalid dotted version {input:?}")]
    InvalidDottedVersion {
        /// The rejected input.
        input: String,
    },

    /// Scope name other than `local` or `global`.
    #[error("invalid scope {input:?}")]
    InvalidScope {
        /// The rejected input.
        input: String,
    },

    /// Tool name not managed by switcher.
    #[error("unsupported tool {tool:?}")]
    UnsupportedTool {
        /// The rejected tool name.
        tool: String,
    },

    /// Neither a local pin file nor a global version is configured.
    ///
    /// This is an expected terminal state, not a fault.
    #[error("no active go version configured")]
    NoActiveVersion,

    /// The requested version is not in the release metadata.
    #[error("go release {version} not found")]
    ReleaseNotFound {
        /// The normalized version that was requested.
        version: String,
    },

    /// The release exists but has no archive for this platform.
    #[error("{version} is not available for {os}/{arch}")]
    PlatformUnavailable {
        /// The normalized version.
        version: String,
        /// Operating system name as used by the release metadata.
        os: String,
        /// Architecture name as used by the release metadata.
        arch: String,
    },

    /// The requested toolchain is not installed locally.
    #[error("toolchain {version} is not installed")]
    ToolchainNotFound {
        /// The normalized version.
        version: String,
    },

    /// Network error during a download or metadata fetch.
    #[error("download error: {message}")]
    Download {
        /// Description of the failure.
        message: String,
    },

    /// The operation was cancelled before it finished.
    #[error("operation cancelled")]
    Cancelled,

    /// Checksum verification failed.
    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// File that was verified.
        file: PathBuf,
        /// The expected checksum.
        expected: String,
        /// The actual checksum.
        actual: String,
    },

    /// An archive entry would land outside the extraction root.
    #[error("unsafe archive path {entry}")]
    UnsafeArchivePath {
        /// The offending entry path as stored in the archive.
        entry: String,
    },

    /// An archive entry is not rooted under the expected top-level directory.
    #[error("unexpected archive root for {entry}")]
    UnexpectedArchiveRoot {
        /// The offending entry path.
        entry: String,
    },

    /// Extraction succeeded but the primary executable is missing.
    #[error("installed toolchain {version} is missing {missing}")]
    CorruptInstall {
        /// The normalized version.
        version: String,
        /// Relative path of the missing executable.
        missing: String,
    },

    /// A single-binary archive did not contain the wanted executable.
    #[error("binary {name} not found in archive")]
    BinaryNotInArchive {
        /// The executable name that was searched for.
        name: String,
    },

    /// The background worker exited without producing a result.
    #[error("background task ended without a result")]
    WorkerLost,

    /// Subprocess exited with non-zero code.
    ///
    /// The exit code is propagated without printing an additional message.
    #[error("process exited with code {code}")]
    ProcessExitCode {
        /// The exit code from the subprocess.
        code: i32,
    },
}

impl SwitcherError {
    /// Creates a new `InvalidVersion` error.
    #[must_use]
    pub fn invalid_version(input: impl Into<String>) -> Self {
        Self::InvalidVersion {
            input: input.into(),
        }
    }

    /// Creates a new `Download` error.
    #[must_use]
    pub fn download(message: impl Into<String>) -> Self {
        Self::Download {
            message: message.into(),
        }
    }

    /// Creates a new `ChecksumMismatch` error.
    #[must_use]
    pub fn checksum_mismatch(
        file: impl Into<PathBuf>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ChecksumMismatch {
            file: file.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new `UnsafeArchivePath` error.
    #[must_use]
    pub fn unsafe_archive_path(entry: impl Into<String>) -> Self {
        Self::UnsafeArchivePath {
            entry: entry.into(),
        }
    }

    /// Creates a new `ProcessExitCode` error.
    #[must_use]
    pub const fn process_exit_code(code: i32) -> Self {
        Self::ProcessExitCode { code }
    }

    /// Returns the first `SwitcherError` in the chain of `err`.
    #[must_use]
    pub fn find(err: &anyhow::Error) -> Option<&Self> {
        err.chain().find_map(|cause| cause.downcast_ref::<Self>())
    }
}

/// Returns `true` if `err` is (or wraps) [`SwitcherError::NoActiveVersion`].
#[must_use]
pub fn is_no_active_version(err: &anyhow::Error) -> bool {
    matches!(SwitcherError::find(err), Some(SwitcherError::NoActiveVersion))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn invalid_version_displays_input() {
        let err = SwitcherError::invalid_version("latest");
        assert_eq!(err.to_string(), "invalid go version \"latest\"");
    }

    #[test]
    fn checksum_mismatch_displays_both_values() {
        let err = SwitcherError::checksum_mismatch("go.tar.gz", "abc123", "def456");
        assert_eq!(
            err.to_string(),
            "checksum mismatch for go.tar.gz: expected abc123, got def456"
        );
    }

    #[test]
    fn platform_unavailable_names_platform() {
        let err = SwitcherError::PlatformUnavailable {
            version: "go1.24.0".to_string(),
            os: "plan9".to_string(),
            arch: "386".to_string(),
        };
        assert_eq!(err.to_string(), "go1.24.0 is not available for plan9/386");
    }

    #[test]
    fn no_active_version_survives_context_layers() {
        let result: anyhow::Result<()> = Err(SwitcherError::NoActiveVersion.into());
        let err = result
            .context("resolve active version")
            .context("delete go1.24.0")
            .unwrap_err();
        assert!(is_no_active_version(&err));
    }

    #[test]
    fn other_errors_are_not_no_active_version() {
        let err = anyhow::Error::from(SwitcherError::Cancelled);
        assert!(!is_no_active_version(&err));
        let err = anyhow::anyhow!("plain failure");
        assert!(!is_no_active_version(&err));
    }

    #[test]
    fn process_exit_code_displays_code() {
        let err = SwitcherError::process_exit_code(42);
        assert_eq!(err.to_string(), "process exited with code 42");
    }
}
