//! Go release metadata and distribution endpoints.
//!
//! Release information comes from the JSON feed published at
//! `https://go.dev/dl/?mode=json&include=all`:
//!
//! ```json
//! [
//!   {
//!     "version": "go1.24.2",
//!     "stable": true,
//!     "files": [
//!       {
//!         "filename": "go1.24.2.linux-amd64.tar.gz",
//!         "os": "linux",
//!         "arch": "amd64",
//!         "version": "go1.24.2",
//!         "sha256": "68097bd6...",
//!         "size": 78665426,
//!         "kind": "archive"
//!       }
//!     ]
//!   }
//! ]
//! ```
//!
//! The feed, the toolchain download base and the golangci-lint download base
//! can each be overridden through environment variables (see [`Endpoints`]).

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::Platform;
use crate::errors::SwitcherError;
use crate::version::GoVersion;

/// Environment variable overriding the release metadata URL.
pub const RELEASES_URL_ENV: &str = "SWITCHER_RELEASES_URL";
/// Environment variable overriding the toolchain download base URL.
pub const GO_DIST_ENV: &str = "SWITCHER_GO_DIST";
/// Environment variable overriding the golangci-lint download base URL.
pub const LINT_DIST_ENV: &str = "SWITCHER_LINT_DIST";

const DEFAULT_RELEASES_URL: &str = "https://go.dev/dl/?mode=json&include=all";
const DEFAULT_GO_DIST: &str = "https://go.dev/dl";
const DEFAULT_LINT_DIST: &str = "https://github.com/golangci/golangci-lint/releases/download";

/// Release file kind for installable archives.
const ARCHIVE_KIND: &str = "archive";
const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Remote locations switcher talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub releases_url: String,
    pub go_download_base: String,
    pub lint_download_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            releases_url: DEFAULT_RELEASES_URL.to_string(),
            go_download_base: DEFAULT_GO_DIST.to_string(),
            lint_download_base: DEFAULT_LINT_DIST.to_string(),
        }
    }
}

impl Endpoints {
    /// Reads overrides from the environment. Empty values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            releases_url: read(RELEASES_URL_ENV, DEFAULT_RELEASES_URL),
            go_download_base: read(GO_DIST_ENV, DEFAULT_GO_DIST)
                .trim_end_matches('/')
                .to_string(),
            lint_download_base: read(LINT_DIST_ENV, DEFAULT_LINT_DIST)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Download URL of a toolchain archive listed in the release metadata.
    #[must_use]
    pub fn go_archive_url(&self, filename: &str) -> String {
        format!("{}/{filename}", self.go_download_base)
    }

    /// Download URL of a golangci-lint release archive.
    #[must_use]
    pub fn lint_archive_url(&self, lint_version: &str, platform: Platform) -> String {
        format!(
            "{}/{lint_version}/{}",
            self.lint_download_base,
            lint_archive_name(lint_version, platform)
        )
    }
}

/// File name of a golangci-lint release archive, e.g.
/// `golangci-lint-1.64.8-linux-amd64.tar.gz`.
#[must_use]
pub fn lint_archive_name(lint_version: &str, platform: Platform) -> String {
    format!(
        "golangci-lint-{}-{}-{}{ARCHIVE_SUFFIX}",
        lint_version.trim_start_matches('v'),
        platform.os,
        platform.arch
    )
}

/// One downloadable file of a release.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseFile {
    pub filename: String,
    pub os: String,
    pub arch: String,
    pub version: String,
    pub sha256: String,
    pub kind: String,
    #[serde(default)]
    pub size: u64,
}

/// A Go release as listed in the metadata feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Release {
    pub version: String,
    #[serde(default)]
    pub stable: bool,
    #[serde(default)]
    pub files: Vec<ReleaseFile>,
}

impl Release {
    /// Returns the `.tar.gz` archive of this release for `platform`.
    #[must_use]
    pub fn archive_for(&self, platform: Platform) -> Option<&ReleaseFile> {
        self.files.iter().find(|f| {
            f.kind == ARCHIVE_KIND
                && f.os == platform.os
                && f.arch == platform.arch
                && f.filename.ends_with(ARCHIVE_SUFFIX)
        })
    }
}

/// Source of release metadata.
#[allow(async_fn_in_trait)]
pub trait ReleaseSource {
    /// Fetches every known release.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be retrieved or decoded, or
    /// [`SwitcherError::Cancelled`] if `cancel` fires first.
    async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<Release>>;
}

/// Fetches release metadata over HTTP.
#[derive(Debug, Clone)]
pub struct HttpReleaseClient {
    client: reqwest::Client,
    url: String,
}

impl HttpReleaseClient {
    #[must_use]
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl ReleaseSource for HttpReleaseClient {
    async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<Release>> {
        let url = &self.url;
        tracing::debug!(%url, "fetching release metadata");

        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(SwitcherError::Cancelled.into()),
            body = fetch_text(&self.client, url) => body?,
        };

        let releases: Vec<Release> = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse release metadata from {url}"))?;
        tracing::debug!(count = releases.len(), "release metadata loaded");
        Ok(releases)
    }
}

async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SwitcherError::download(format!("fetching releases from {url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SwitcherError::download(format!(
            "fetching releases from {url} returned status {status}"
        ))
        .into());
    }

    Ok(response
        .text()
        .await
        .map_err(|e| SwitcherError::download(format!("reading releases from {url}: {e}")))?)
}

/// Finds the archive of `version` for `platform`.
///
/// # Errors
///
/// Returns [`SwitcherError::ReleaseNotFound`] if no release normalizes to
/// `version`, or [`SwitcherError::PlatformUnavailable`] if the first such
/// release has no suitable archive.
pub fn find_archive(
    releases: &[Release],
    version: GoVersion,
    platform: Platform,
) -> Result<ReleaseFile, SwitcherError> {
    let release = releases
        .iter()
        .find(|r| r.version.parse::<GoVersion>().ok() == Some(version))
        .ok_or_else(|| SwitcherError::ReleaseNotFound {
            version: version.to_string(),
        })?;

    release
        .archive_for(platform)
        .cloned()
        .ok_or_else(|| SwitcherError::PlatformUnavailable {
            version: version.to_string(),
            os: platform.os.to_string(),
            arch: platform.arch.to_string(),
        })
}

/// Lists versions installable on `platform`: normalized, unique, newest
/// first. Pre-releases and other non-normalizable versions are left out.
#[must_use]
pub fn available_versions(releases: &[Release], platform: Platform) -> Vec<GoVersion> {
    let unique: BTreeSet<GoVersion> = releases
        .iter()
        .filter(|r| r.archive_for(platform).is_some())
        .filter_map(|r| r.version.parse().ok())
        .collect();
    unique.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const LINUX: Platform = Platform::new("linux", "amd64");

    fn archive(version: &str, os: &str, arch: &str) -> ReleaseFile {
        ReleaseFile {
            filename: format!("{version}.{os}-{arch}.tar.gz"),
            os: os.to_string(),
            arch: arch.to_string(),
            version: version.to_string(),
            sha256: "ab".repeat(32),
            kind: ARCHIVE_KIND.to_string(),
            size: 10,
        }
    }

    fn release(version: &str, files: Vec<ReleaseFile>) -> Release {
        Release {
            version: version.to_string(),
            stable: true,
            files,
        }
    }

    fn sample() -> Vec<Release> {
        vec![
            release("go1.25rc1", vec![archive("go1.25rc1", "linux", "amd64")]),
            release(
                "go1.24.2",
                vec![
                    archive("go1.24.2", "linux", "amd64"),
                    archive("go1.24.2", "darwin", "arm64"),
                ],
            ),
            release("go1.23.0", vec![archive("go1.23.0", "darwin", "arm64")]),
            release("go1.20", vec![archive("go1.20", "linux", "amd64")]),
        ]
    }

    #[test]
    fn parses_go_dev_feed_shape() {
        let json = r#"[{"version": "go1.24.2", "stable": true, "files": [
            {"filename": "go1.24.2.src.tar.gz", "os": "", "arch": "",
             "version": "go1.24.2", "sha256": "aa", "size": 1, "kind": "source"},
            {"filename": "go1.24.2.linux-amd64.tar.gz", "os": "linux", "arch": "amd64",
             "version": "go1.24.2", "sha256": "bb", "size": 2, "kind": "archive"},
            {"filename": "go1.24.2.linux-amd64.msi", "os": "linux", "arch": "amd64",
             "version": "go1.24.2", "sha256": "cc", "size": 3, "kind": "installer"}
        ]}]"#;
        let releases: Vec<Release> = serde_json::from_str(json).expect("Should parse feed");

        let file = releases[0].archive_for(LINUX).expect("Should find archive");
        assert_eq!(file.filename, "go1.24.2.linux-amd64.tar.gz");
        assert_eq!(file.sha256, "bb");
    }

    #[test]
    fn archive_for_requires_tar_gz_archive() {
        let mut zip = archive("go1.24.2", "linux", "amd64");
        zip.filename = "go1.24.2.linux-amd64.zip".to_string();
        let mut installer = archive("go1.24.2", "linux", "amd64");
        installer.kind = "installer".to_string();
        let r = release("go1.24.2", vec![zip, installer]);
        assert!(r.archive_for(LINUX).is_none());
    }

    #[test]
    fn find_archive_normalizes_release_versions() {
        let file = find_archive(&sample(), GoVersion::new(1, 20, 0), LINUX).unwrap();
        assert_eq!(file.filename, "go1.20.linux-amd64.tar.gz");
    }

    #[test]
    fn find_archive_distinguishes_missing_release_and_platform() {
        let releases = sample();
        assert!(matches!(
            find_archive(&releases, GoVersion::new(1, 99, 0), LINUX),
            Err(SwitcherError::ReleaseNotFound { .. })
        ));
        let err = find_archive(&releases, GoVersion::new(1, 23, 0), LINUX).unwrap_err();
        assert_eq!(err.to_string(), "go1.23.0 is not available for linux/amd64");
    }

    #[test]
    fn available_versions_sorted_unique_and_filtered() {
        let mut releases = sample();
        releases.push(release("go1.24.2", vec![archive("go1.24.2", "linux", "amd64")]));

        let versions: Vec<String> = available_versions(&releases, LINUX)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(versions, ["go1.24.2", "go1.20.0"]);
    }

    #[test]
    fn endpoints_apply_overrides_and_trim_slashes() {
        let vars: HashMap<&str, &str> = [
            (GO_DIST_ENV, "http://mirror.local/go/"),
            (LINT_DIST_ENV, "   "),
        ]
        .into_iter()
        .collect();
        let endpoints = Endpoints::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));

        assert_eq!(endpoints.releases_url, DEFAULT_RELEASES_URL);
        assert_eq!(
            endpoints.go_archive_url("go1.24.2.linux-amd64.tar.gz"),
            "http://mirror.local/go/go1.24.2.linux-amd64.tar.gz"
        );
        assert_eq!(
            endpoints.lint_archive_url("v1.64.8", LINUX),
            "https://github.com/golangci/golangci-lint/releases/download/v1.64.8/golangci-lint-1.64.8-linux-amd64.tar.gz"
        );
    }

    #[tokio::test]
    async fn http_client_fetches_and_decodes() {
        let body = serde_json::to_vec(&sample()).unwrap();
        let server = crate::test_support::TestServer::start(vec![("/dl", 200, body)]);
        let client = HttpReleaseClient::new(
            crate::toolchain::download::http_client().unwrap(),
            server.url("/dl"),
        );

        let releases = client
            .fetch(&CancellationToken::new())
            .await
            .expect("Should fetch");
        assert_eq!(releases.len(), 4);
    }

    #[tokio::test]
    async fn http_client_reports_bad_status() {
        let server = crate::test_support::TestServer::start(vec![("/dl", 500, b"oops".to_vec())]);
        let client = HttpReleaseClient::new(
            crate::toolchain::download::http_client().unwrap(),
            server.url("/dl"),
        );

        let err = client.fetch(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            SwitcherError::find(&err),
            Some(SwitcherError::Download { .. })
        ));
    }
}
