//! Install, use, sync and delete workflows.
//!
//! [`Service`] ties the building blocks together: release metadata, the
//! download cache, archive extraction, scope resolution, `config.json` and
//! golangci-lint pinning. Every long-running method takes a
//! [`CancellationToken`] and a [`Reporter`] so it can run behind a
//! [`ProgressBridge`](crate::bridge::ProgressBridge).
//!
//! Workflows are sequential and stop at the first failure. Nothing already
//! written is rolled back; every individual write is atomic.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::config::{read_config, update_config, write_config};
use crate::errors::{SwitcherError, is_no_active_version};
use crate::progress::{Reporter, Stage};
use crate::scope::{
    ActiveVersion, Scope, clear_global_version, clear_local_version_at, find_local_version,
    global_version, resolve_active_version, set_active_version, set_global_version,
    set_local_version_at,
};
use crate::toolchain::archive::extract_toolchain;
use crate::toolchain::cache::ensure_cached;
use crate::toolchain::download::http_client;
use crate::toolchain::paths::{GO_TOOLS, GOLANGCI_LINT};
use crate::toolchain::releases::{available_versions, find_archive};
use crate::toolchain::shims::{self, PathHint};
use crate::toolchain::{Endpoints, HttpReleaseClient, Platform, ReleaseSource, SwitcherPaths};
use crate::tools::LintSync;
use crate::tools::golangci;
use crate::version::{GoVersion, normalize};

/// Outcome of [`Service::install`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOutcome {
    pub version: GoVersion,
    /// `false` when the toolchain was already present.
    pub installed_now: bool,
}

/// Outcome of [`Service::use_version`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseOutcome {
    pub version: GoVersion,
    pub scope: Scope,
    pub installed_now: bool,
    pub golangci_lint: String,
}

/// Outcome of [`Service::sync_tools`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSync {
    pub go: GoVersion,
    pub golangci_lint: String,
}

/// Outcome of [`Service::delete_installed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_version: GoVersion,
    /// The deleted version was the active one for the working directory.
    pub was_active: bool,
    /// The active scope was moved to the newest remaining toolchain.
    pub switched_to_newest: bool,
    pub active_after: Option<ActiveVersion>,
    /// Set when the companion re-sync after switching failed.
    pub tool_sync_warning: Option<String>,
}

/// The orchestration layer behind every CLI command.
pub struct Service<R> {
    paths: SwitcherPaths,
    endpoints: Endpoints,
    platform: Platform,
    releases: R,
    client: reqwest::Client,
    self_binary: Option<PathBuf>,
}

impl Service<HttpReleaseClient> {
    /// Builds a service from `SWITCHER_*` environment variables.
    ///
    /// The running executable is installed next to the shims.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory, the platform or the HTTP
    /// client cannot be determined.
    pub fn from_env() -> Result<Self> {
        let paths = SwitcherPaths::from_env()?;
        let endpoints = Endpoints::from_env();
        let platform = Platform::detect()?;
        let client = http_client()?;
        let releases = HttpReleaseClient::new(client.clone(), endpoints.releases_url.clone());
        tracing::debug!(root = %paths.root.display(), %platform, "service configured");

        Ok(Self::new(paths, endpoints, platform, releases, client)
            .with_self_binary(std::env::current_exe().ok()))
    }
}

impl<R: ReleaseSource> Service<R> {
    #[must_use]
    pub fn new(
        paths: SwitcherPaths,
        endpoints: Endpoints,
        platform: Platform,
        releases: R,
        client: reqwest::Client,
    ) -> Self {
        Self {
            paths,
            endpoints,
            platform,
            releases,
            client,
            self_binary: None,
        }
    }

    /// Sets the executable copied into `bin/` on every shim refresh.
    #[must_use]
    pub fn with_self_binary(mut self, binary: Option<PathBuf>) -> Self {
        self.self_binary = binary;
        self
    }

    #[must_use]
    pub fn paths(&self) -> &SwitcherPaths {
        &self.paths
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Installs a toolchain unless it is already present.
    ///
    /// # Errors
    ///
    /// Returns [`SwitcherError::InvalidVersion`],
    /// [`SwitcherError::ReleaseNotFound`],
    /// [`SwitcherError::PlatformUnavailable`], download, checksum and
    /// extraction errors.
    pub async fn install(
        &self,
        input: &str,
        cancel: &CancellationToken,
        reporter: &Reporter,
    ) -> Result<InstallOutcome> {
        let version = normalize(input)?;
        self.paths.ensure_layout()?;

        if self.paths.toolchain_exists(version) {
            reporter.step(Stage::GoInstall, format!("{version} is already installed"));
            return Ok(InstallOutcome {
                version,
                installed_now: false,
            });
        }

        reporter.step(Stage::ReleaseFetch, "Fetching release metadata");
        let releases = self.releases.fetch(cancel).await?;

        reporter.step(
            Stage::ReleaseSelect,
            format!("Selecting {version} for {}", self.platform),
        );
        let file = find_archive(&releases, version, self.platform)?;

        let url = self.endpoints.go_archive_url(&file.filename);
        let cache_path = self.paths.cache_path(&file.filename);
        ensure_cached(
            &self.client,
            &url,
            &cache_path,
            Some(&file.sha256),
            cancel,
            reporter,
        )
        .await
        .with_context(|| format!("Failed to fetch {version}"))?;

        reporter.step(Stage::Extract, format!("Extracting {}", file.filename));
        let target = self.paths.toolchain_dir(version);
        extract_toolchain(&cache_path, &target)
            .with_context(|| format!("Failed to install {version}"))?;
        tracing::info!(%version, path = %target.display(), "installed toolchain");

        self.refresh_shims(reporter)?;
        reporter.step(Stage::Done, format!("Installed {version}"));
        Ok(InstallOutcome {
            version,
            installed_now: true,
        })
    }

    /// Installs if needed, activates for `scope`, then syncs golangci-lint.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error. A pin written before a later
    /// failure stays in place.
    pub async fn use_version(
        &self,
        input: &str,
        scope: Scope,
        cwd: &Path,
        cancel: &CancellationToken,
        reporter: &Reporter,
    ) -> Result<UseOutcome> {
        let installed = self.install(input, cancel, reporter).await?;
        let version = installed.version;

        reporter.step(Stage::ScopeUpdate, format!("Activating {version} ({scope})"));
        set_active_version(version, scope, cwd, &self.paths)?;
        self.refresh_shims(reporter)?;

        let golangci_lint = self
            .sync_tools_for_version(version, cancel, reporter)
            .await?;
        reporter.step(Stage::Done, format!("Now using {version}"));

        Ok(UseOutcome {
            version,
            scope,
            installed_now: installed.installed_now,
            golangci_lint,
        })
    }

    /// Repairs the golangci-lint pin for `go` and installs it if missing.
    ///
    /// `config.json` is written only after the install succeeded.
    ///
    /// # Errors
    ///
    /// Returns config, download and extraction errors.
    pub async fn sync_tools_for_version(
        &self,
        go: GoVersion,
        cancel: &CancellationToken,
        reporter: &Reporter,
    ) -> Result<String> {
        let mut config = read_config(&self.paths)?;
        let lint_version = self
            .lint_sync(cancel, reporter)
            .ensure_for_go_version(&mut config, go)
            .await?;
        write_config(&self.paths, &config)?;
        Ok(lint_version)
    }

    /// Syncs companion tools for the active version, or for the version of
    /// an explicit scope.
    ///
    /// # Errors
    ///
    /// Returns [`SwitcherError::NoActiveVersion`] if the requested scope has
    /// no version, and the errors of
    /// [`sync_tools_for_version`](Self::sync_tools_for_version).
    pub async fn sync_tools(
        &self,
        cwd: &Path,
        scope: Option<Scope>,
        cancel: &CancellationToken,
        reporter: &Reporter,
    ) -> Result<ToolSync> {
        let go = match scope {
            None => resolve_active_version(cwd, &self.paths)?.version,
            Some(Scope::Local) => find_local_version(cwd)?
                .map(|(version, _)| version)
                .ok_or(SwitcherError::NoActiveVersion)
                .with_context(|| format!("No local version file above {}", cwd.display()))?,
            Some(Scope::Global) => global_version(&self.paths)?
                .ok_or(SwitcherError::NoActiveVersion)
                .context("No global version configured")?,
        };

        let golangci_lint = self.sync_tools_for_version(go, cancel, reporter).await?;
        reporter.step(Stage::Done, format!("golangci-lint {golangci_lint} ready for {go}"));
        Ok(ToolSync { go, golangci_lint })
    }

    /// Removes an installed toolchain and repairs the active version.
    ///
    /// If the deleted version was active, the same scope is moved to the
    /// newest remaining toolchain, or cleared when none remain. A failing
    /// companion re-sync after the switch is reported in
    /// [`DeleteResult::tool_sync_warning`] instead of failing the delete.
    ///
    /// # Errors
    ///
    /// Returns [`SwitcherError::ToolchainNotFound`] if the version is not
    /// installed, and I/O errors.
    pub async fn delete_installed(
        &self,
        cwd: &Path,
        input: &str,
        cancel: &CancellationToken,
        reporter: &Reporter,
    ) -> Result<DeleteResult> {
        let version = normalize(input)?;
        let active = self.try_current(cwd)?;

        reporter.step(Stage::Delete, format!("Removing {version}"));
        self.paths.remove_toolchain(version)?;
        update_config(&self.paths, |config| {
            config.golangci_lint_by_go.remove(&version);
            Ok(())
        })?;
        tracing::info!(%version, "deleted toolchain");

        let mut result = DeleteResult {
            deleted_version: version,
            was_active: false,
            switched_to_newest: false,
            active_after: None,
            tool_sync_warning: None,
        };

        let active = match active {
            Some(active) if active.version == version => active,
            other => {
                result.active_after = other;
                return Ok(result);
            }
        };
        result.was_active = true;

        let Some(&newest) = self.paths.list_installed_versions()?.first() else {
            reporter.step(
                Stage::ScopeUpdate,
                format!("No toolchains left, clearing {} version", active.scope),
            );
            match active.scope {
                Scope::Local => clear_local_version_at(&active.source)?,
                Scope::Global => clear_global_version(&self.paths)?,
            }
            return Ok(result);
        };

        reporter.step(
            Stage::Switch,
            format!("Switching {} version to {newest}", active.scope),
        );
        match active.scope {
            Scope::Local => set_local_version_at(&active.source, newest)?,
            Scope::Global => set_global_version(&self.paths, newest)?,
        }
        result.switched_to_newest = true;
        result.active_after = Some(ActiveVersion {
            version: newest,
            ..active
        });
        self.refresh_shims(reporter)?;

        if let Err(err) = self.sync_tools_for_version(newest, cancel, reporter).await {
            tracing::warn!(%newest, "golangci-lint sync failed after switch: {err:#}");
            result.tool_sync_warning = Some(format!("{err:#}"));
        }
        Ok(result)
    }

    /// Returns the executable `tool` resolves to in `cwd`.
    ///
    /// # Errors
    ///
    /// Returns [`SwitcherError::UnsupportedTool`] for unknown tools,
    /// [`SwitcherError::NoActiveVersion`], and an error if the toolchain or
    /// the pinned golangci-lint is not installed.
    pub fn resolve_binary_for_tool(&self, cwd: &Path, tool: &str) -> Result<PathBuf> {
        if tool != GOLANGCI_LINT && !GO_TOOLS.contains(&tool) {
            return Err(SwitcherError::UnsupportedTool {
                tool: tool.to_string(),
            }
            .into());
        }

        let active = resolve_active_version(cwd, &self.paths)?;
        if tool == GOLANGCI_LINT {
            let config = read_config(&self.paths)?;
            let (binary, _) =
                golangci::resolve_binary(&self.paths, &config, active.version, self.platform)?;
            return Ok(binary);
        }

        if !self.paths.toolchain_exists(active.version) {
            return Err(SwitcherError::ToolchainNotFound {
                version: active.version.to_string(),
            })
            .with_context(|| {
                format!(
                    "Active version from {} is not installed. Run `switcher install {}`.",
                    active.source.display(),
                    active.version
                )
            });
        }
        self.paths.go_tool_binary(active.version, tool)
    }

    /// Installed toolchains, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the toolchains directory cannot be read.
    pub fn list_local(&self) -> Result<Vec<GoVersion>> {
        self.paths.list_installed_versions()
    }

    /// Releases installable on this platform, newest first.
    ///
    /// # Errors
    ///
    /// Returns metadata fetch errors.
    pub async fn list_remote(&self, cancel: &CancellationToken) -> Result<Vec<GoVersion>> {
        let releases = self.releases.fetch(cancel).await?;
        Ok(available_versions(&releases, self.platform))
    }

    /// Resolves the active version for `cwd`.
    ///
    /// # Errors
    ///
    /// Returns [`SwitcherError::NoActiveVersion`] when nothing is configured.
    pub fn current(&self, cwd: &Path) -> Result<ActiveVersion> {
        resolve_active_version(cwd, &self.paths)
    }

    #[must_use]
    pub fn path_hint(&self) -> PathHint {
        shims::path_hint(&self.paths)
    }

    /// Writes the shims and installs the switcher binary next to them.
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be written.
    pub fn ensure_shims(&self) -> Result<()> {
        shims::ensure_shims(&self.paths, self.self_binary.as_deref())
    }

    fn refresh_shims(&self, reporter: &Reporter) -> Result<()> {
        reporter.step(Stage::ShimUpdate, "Refreshing shims");
        self.ensure_shims()
    }

    fn try_current(&self, cwd: &Path) -> Result<Option<ActiveVersion>> {
        match resolve_active_version(cwd, &self.paths) {
            Ok(active) => Ok(Some(active)),
            Err(err) if is_no_active_version(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn lint_sync<'a>(
        &'a self,
        cancel: &'a CancellationToken,
        reporter: &'a Reporter,
    ) -> LintSync<'a> {
        LintSync {
            paths: &self.paths,
            endpoints: &self.endpoints,
            platform: self.platform,
            client: &self.client,
            cancel,
            reporter,
        }
    }
}
