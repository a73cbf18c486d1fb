//! SHA-256 verification for cached archives.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::errors::SwitcherError;

/// Verifies that a file matches the expected SHA-256 checksum.
///
/// The comparison ignores case and surrounding whitespace in `expected`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or
/// [`SwitcherError::ChecksumMismatch`] if the digest differs.
pub fn verify_checksum(file_path: &Path, expected: &str) -> Result<()> {
    let computed = compute_sha256(file_path)?;
    let expected = expected.trim().to_ascii_lowercase();

    if computed != expected {
        return Err(SwitcherError::checksum_mismatch(file_path, expected, computed).into());
    }

    Ok(())
}

/// Returns `true` if the file exists and matches `expected`.
///
/// Read failures count as a mismatch.
#[must_use]
pub fn matches_checksum(file_path: &Path, expected: &str) -> bool {
    verify_checksum(file_path, expected).is_ok()
}

/// Computes the SHA-256 of a file as lowercase hex, streaming its content.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn compute_sha256(file_path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open file for checksum: {}", file_path.display()))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).with_context(|| {
            format!("Failed to read file for checksum: {}", file_path.display())
        })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
