//! Download cache for release archives.
//!
//! A cache entry is either absent or complete and checksum-valid. Entries
//! that fail verification are deleted and fetched again.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::fsutil;
use crate::progress::{Reporter, Stage};
use crate::toolchain::download::download_to_file;
use crate::toolchain::verify::{matches_checksum, verify_checksum};

/// Makes sure `cache_path` holds the archive served at `url`.
///
/// When `sha256` is `None` an existing file is trusted as is; otherwise it is
/// verified, and a freshly downloaded file must match or it is removed.
///
/// # Errors
///
/// Returns download, cancellation and checksum errors. A failed call never
/// leaves an unverified file at `cache_path`.
pub async fn ensure_cached(
    client: &reqwest::Client,
    url: &str,
    cache_path: &Path,
    sha256: Option<&str>,
    cancel: &CancellationToken,
    reporter: &Reporter,
) -> Result<PathBuf> {
    let label = cache_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| url.to_string());
    let sha256 = sha256.map(str::trim).filter(|s| !s.is_empty());

    if cache_path.is_file() {
        match sha256 {
            None => {
                tracing::debug!(path = %cache_path.display(), "using cached archive");
                return Ok(cache_path.to_path_buf());
            }
            Some(expected) if matches_checksum(cache_path, expected) => {
                tracing::debug!(path = %cache_path.display(), "cached archive verified");
                reporter.step(Stage::Verify, format!("Using cached {label}"));
                return Ok(cache_path.to_path_buf());
            }
            Some(_) => {
                tracing::warn!(
                    path = %cache_path.display(),
                    "cached archive failed verification, downloading again"
                );
                fsutil::remove_file_if_exists(cache_path)?;
            }
        }
    }

    reporter.step(Stage::Download, format!("Downloading {label}"));
    download_to_file(client, url, cache_path, &label, cancel, reporter)
        .await
        .with_context(|| format!("Failed to download {label}"))?;

    if let Some(expected) = sha256 {
        reporter.step(Stage::Verify, format!("Verifying {label}"));
        if let Err(err) = verify_checksum(cache_path, expected) {
            fsutil::remove_file_if_exists(cache_path)?;
            return Err(err);
        }
    }

    Ok(cache_path.to_path_buf())
}
