//! HTTP downloads for release archives.
//!
//! Downloads stream into a temporary file next to the destination and are
//! promoted by rename only after the whole body was written. A transport
//! error, a non-2xx status, a write failure or cancellation removes the
//! temporary file and leaves the destination untouched. Failed downloads are
//! not retried.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::errors::SwitcherError;
use crate::fsutil;
use crate::progress::{Reporter, Stage};

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Minimum interval between progress events in milliseconds.
const PROGRESS_INTERVAL_MS: u128 = 100;

/// Builds the HTTP client shared by metadata fetches and downloads.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(concat!("switcher/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Downloads `url` into `dest`, reporting progress under `label`.
///
/// # Errors
///
/// Returns [`SwitcherError::Download`] for transport and status failures,
/// [`SwitcherError::Cancelled`] if `cancel` fires first, and an I/O error if
/// the file cannot be written or promoted.
pub async fn download_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    label: &str,
    cancel: &CancellationToken,
    reporter: &Reporter,
) -> Result<()> {
    tracing::debug!(%url, dest = %dest.display(), "starting download");

    let response = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(SwitcherError::Cancelled.into()),
        response = client.get(url).send() => response
            .map_err(|e| SwitcherError::download(format!("request to {url} failed: {e}")))?,
    };

    let status = response.status();
    if !status.is_success() {
        return Err(
            SwitcherError::download(format!("unexpected status {status} from {url}")).into(),
        );
    }

    let total = response.content_length().unwrap_or(0);
    reporter.emit(Stage::Download, label, 0, total);

    let tmp = fsutil::temp_file_beside(dest)?;
    let handle = tmp
        .reopen()
        .with_context(|| format!("Failed to open temp file for {}", dest.display()))?;
    let mut file = tokio::fs::File::from_std(handle);

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let mut last_event = Instant::now();

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(SwitcherError::Cancelled.into()),
            next = stream.next() => next,
        };
        let Some(chunk) = next else { break };
        let chunk =
            chunk.map_err(|e| SwitcherError::download(format!("reading body of {url}: {e}")))?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write to {}", dest.display()))?;
        downloaded += chunk.len() as u64;

        if last_event.elapsed().as_millis() >= PROGRESS_INTERVAL_MS {
            reporter.emit(Stage::Download, label, downloaded, total);
            last_event = Instant::now();
        }
    }

    file.flush()
        .await
        .with_context(|| format!("Failed to flush {}", dest.display()))?;
    drop(file);

    reporter.emit(Stage::Download, label, downloaded, total);
    fsutil::persist_temp(tmp, dest, 0o644)?;
    tracing::debug!(bytes = downloaded, dest = %dest.display(), "download complete");
    Ok(())
}
