//! golangci-lint installation and per-toolchain pinning.
//!
//! Each toolchain maps to one golangci-lint version in `config.json`. The
//! mapping is created from [`recommend`] on first sync and repaired on every
//! later sync: a pin that is not a dotted version, or that is older than the
//! current recommendation, is replaced by the recommendation.

use std::cmp::Ordering;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use super::compat::recommend_version;
use crate::config::Config;
use crate::progress::{Reporter, Stage};
use crate::toolchain::archive::extract_binary;
use crate::toolchain::cache::ensure_cached;
use crate::toolchain::paths::GOLANGCI_LINT;
use crate::toolchain::releases::lint_archive_name;
use crate::toolchain::{Endpoints, Platform, SwitcherPaths};
use crate::version::{GoVersion, compare_dotted};

/// Picks the golangci-lint version for `go`, repairing the stored pin.
///
/// Returns the chosen version; `config` is updated in place.
pub fn select_version(config: &mut Config, go: GoVersion) -> String {
    let recommended = recommend_version(go);
    let keep = config
        .golangci_lint_by_go
        .get(&go)
        .map(|pinned| pinned.trim())
        .filter(|pinned| {
            compare_dotted(pinned, recommended).is_ok_and(|ord| ord != Ordering::Less)
        })
        .map(str::to_owned);

    let chosen = keep.unwrap_or_else(|| recommended.to_string());
    if config.golangci_lint_by_go.get(&go) != Some(&chosen) {
        tracing::info!(%go, lint = %chosen, "updating golangci-lint pin");
        config.golangci_lint_by_go.insert(go, chosen.clone());
    }
    chosen
}

/// Locates the installed golangci-lint for `go` without installing anything.
///
/// # Errors
///
/// Returns an error if the pinned (or recommended) version is not installed.
pub fn resolve_binary(
    paths: &SwitcherPaths,
    config: &Config,
    go: GoVersion,
    platform: Platform,
) -> Result<(PathBuf, String)> {
    let lint_version = config
        .golangci_lint_by_go
        .get(&go)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map_or_else(|| recommend_version(go).to_string(), str::to_owned);

    let binary = paths.golangci_lint_binary_path(&lint_version, platform);
    if !binary.is_file() {
        anyhow::bail!(
            "golangci-lint {lint_version} is not installed for {go} (expected {}). \
             Run `switcher tools sync`.",
            binary.display()
        );
    }
    Ok((binary, lint_version))
}

/// Everything needed to fetch and install golangci-lint releases.
pub struct LintSync<'a> {
    pub paths: &'a SwitcherPaths,
    pub endpoints: &'a Endpoints,
    pub platform: Platform,
    pub client: &'a reqwest::Client,
    pub cancel: &'a CancellationToken,
    pub reporter: &'a Reporter,
}

impl LintSync<'_> {
    /// Repairs the pin for `go` and installs that version if missing.
    ///
    /// `config` is modified but not written; the caller persists it once this
    /// returns successfully.
    ///
    /// # Errors
    ///
    /// Returns download, cancellation and extraction errors.
    pub async fn ensure_for_go_version(
        &self,
        config: &mut Config,
        go: GoVersion,
    ) -> Result<String> {
        let lint_version = select_version(config, go);
        let binary = self
            .paths
            .golangci_lint_binary_path(&lint_version, self.platform);
        if binary.is_file() {
            self.reporter.step(
                Stage::LintSync,
                format!("golangci-lint {lint_version} already installed"),
            );
            return Ok(lint_version);
        }

        self.install(&lint_version)
            .await
            .with_context(|| format!("Failed to install golangci-lint {lint_version}"))?;
        Ok(lint_version)
    }

    /// Downloads (or reuses from cache) and installs one release.
    ///
    /// # Errors
    ///
    /// Returns download, cancellation and extraction errors.
    pub async fn install(&self, lint_version: &str) -> Result<()> {
        self.paths.ensure_layout()?;
        let archive_name = lint_archive_name(lint_version, self.platform);
        let url = self.endpoints.lint_archive_url(lint_version, self.platform);
        let cache_path = self.paths.cache_path(&archive_name);

        self.reporter.step(
            Stage::LintSync,
            format!("Installing golangci-lint {lint_version}"),
        );
        ensure_cached(
            self.client,
            &url,
            &cache_path,
            None,
            self.cancel,
            self.reporter,
        )
        .await?;

        let binary = self
            .paths
            .golangci_lint_binary_path(lint_version, self.platform);
        self.reporter.step(Stage::Extract, format!("Extracting {archive_name}"));
        extract_binary(&cache_path, &binary, GOLANGCI_LINT)?;
        tracing::info!(
            version = lint_version,
            path = %binary.display(),
            "installed golangci-lint"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestServer, lint_archive, write};
    use crate::toolchain::download::http_client;

    const GO_126: GoVersion = GoVersion::new(1, 26, 0);
    const LINUX: Platform = Platform::new("linux", "amd64");

    fn pinned(version: &str) -> Config {
        let mut config = Config::default();
        config
            .golangci_lint_by_go
            .insert(GO_126, version.to_string());
        config
    }

    #[test]
    fn stale_pin_is_upgraded() {
        let mut config = pinned("v1.61.0");
        assert_eq!(select_version(&mut config, GO_126), "v2.9.0");
        assert_eq!(config.golangci_lint_by_go[&GO_126], "v2.9.0");
    }

    #[test]
    fn newer_pin_is_preserved() {
        let mut config = pinned("v9.9.9");
        assert_eq!(select_version(&mut config, GO_126), "v9.9.9");
    }

    #[test]
    fn invalid_pin_is_replaced() {
        let mut config = pinned("latest");
        assert_eq!(select_version(&mut config, GO_126), "v2.9.0");
        assert_eq!(config.golangci_lint_by_go[&GO_126], "v2.9.0");
    }

    #[test]
    fn missing_pin_is_created() {
        let mut config = Config::default();
        let go = GoVersion::new(1, 24, 2);
        assert_eq!(select_version(&mut config, go), "v1.64.8");
        assert_eq!(config.golangci_lint_by_go[&go], "v1.64.8");
    }

    #[test]
    fn resolve_binary_requires_installation() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SwitcherPaths::with_root(dir.path().to_path_buf());
        let config = pinned("v2.9.0");

        assert!(resolve_binary(&paths, &config, GO_126, LINUX).is_err());

        let binary = paths.golangci_lint_binary_path("v2.9.0", LINUX);
        write(&binary, b"#!/bin/sh\n");
        let (found, version) = resolve_binary(&paths, &config, GO_126, LINUX).unwrap();
        assert_eq!(found, binary);
        assert_eq!(version, "v2.9.0");
    }

    #[tokio::test]
    async fn installed_binary_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SwitcherPaths::with_root(dir.path().to_path_buf());
        let endpoints = Endpoints {
            lint_download_base: "http://127.0.0.1:1".to_string(),
            ..Endpoints::default()
        };
        write(&paths.golangci_lint_binary_path("v9.9.9", LINUX), b"x");
        let client = http_client().unwrap();
        let sync = LintSync {
            paths: &paths,
            endpoints: &endpoints,
            platform: LINUX,
            client: &client,
            cancel: &CancellationToken::new(),
            reporter: &Reporter::silent(),
        };

        let mut config = pinned("v9.9.9");
        let version = sync.ensure_for_go_version(&mut config, GO_126).await.unwrap();
        assert_eq!(version, "v9.9.9");
    }

    #[tokio::test]
    async fn downloads_and_installs_missing_release() {
        let route = "/v2.9.0/golangci-lint-2.9.0-linux-amd64.tar.gz";
        let server = TestServer::start(vec![(
            route,
            200,
            lint_archive("v2.9.0", "linux", "amd64"),
        )]);
        let dir = tempfile::tempdir().unwrap();
        let paths = SwitcherPaths::with_root(dir.path().to_path_buf());
        let endpoints = Endpoints {
            lint_download_base: server.base_url().to_string(),
            ..Endpoints::default()
        };
        let client = http_client().unwrap();
        let sync = LintSync {
            paths: &paths,
            endpoints: &endpoints,
            platform: LINUX,
            client: &client,
            cancel: &CancellationToken::new(),
            reporter: &Reporter::silent(),
        };

        let mut config = Config::default();
        let version = sync.ensure_for_go_version(&mut config, GO_126).await.unwrap();

        assert_eq!(version, "v2.9.0");
        assert_eq!(server.hits(route), 1);
        let binary = paths.golangci_lint_binary_path("v2.9.0", LINUX);
        assert_eq!(std::fs::read(binary).unwrap(), b"#!/bin/sh\necho lint\n");
        assert!(paths.cache.join("golangci-lint-2.9.0-linux-amd64.tar.gz").is_file());
    }
}
