//! Install command for the switcher CLI.
//!
//! Downloads, verifies and extracts a Go toolchain. Installing does not
//! change the active version; use `switcher use` for that.
//!
//! ## Usage
//!
//! ```bash
//! switcher install 1.24.2
//! switcher install go1.23
//! ```

use anyhow::Result;
use clap::Args;

use super::{print_path_hint, run_with_progress};
use switcher::service::Service;

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Go version to install (e.g. "1.24.2", "go1.23").
    pub version: String,
}

/// Executes the install command.
///
/// # Errors
///
/// Returns an error if the version is invalid or unknown, not built for this
/// platform, or the download, verification or extraction fails.
pub fn execute(args: &InstallArgs) -> Result<()> {
    let service = Service::from_env()?;
    let hint = service.path_hint();
    let version = args.version.clone();

    let outcome = run_with_progress(move |reporter, cancel| async move {
        service.install(&version, &cancel, &reporter).await
    })?;

    if outcome.installed_now {
        println!("installed {}", outcome.version);
    } else {
        println!("{} is already installed", outcome.version);
    }
    print_path_hint(&hint);
    Ok(())
}
