//! Use command for the switcher CLI.
//!
//! Installs the toolchain if needed, activates it for the chosen scope and
//! syncs golangci-lint for it.
//!
//! ## Usage
//!
//! ```bash
//! switcher use 1.24.2                 # Global default
//! switcher use 1.22 --scope local     # Pin the current directory
//! ```

use anyhow::Result;
use clap::Args;

use super::{print_path_hint, run_with_progress, working_dir};
use switcher::scope::Scope;
use switcher::service::Service;

/// Arguments for the use command.
#[derive(Args)]
pub struct UseArgs {
    /// Go version to activate.
    pub version: String,

    /// Where to record the choice: `global` (config.json) or `local`
    /// (.switcher-version in the current directory).
    #[clap(long, default_value = "global")]
    pub scope: Scope,
}

/// Executes the use command.
///
/// # Errors
///
/// Returns the error of the first failing step. A pin written before a
/// later failure is kept.
pub fn execute(args: &UseArgs) -> Result<()> {
    let service = Service::from_env()?;
    let cwd = working_dir()?;
    let version = args.version.clone();
    let scope = args.scope;

    let (outcome, service) = run_with_progress({
        let cwd = cwd.clone();
        move |reporter, cancel| async move {
            let outcome = service
                .use_version(&version, scope, &cwd, &cancel, &reporter)
                .await?;
            Ok((outcome, service))
        }
    })?;

    println!("configured Go version {} ({scope})", outcome.version);
    if let Ok(active) = service.current(&cwd) {
        println!(
            "effective active version is {} ({})",
            active.version, active.scope
        );
        if active.version != outcome.version || active.scope != scope {
            println!("note: local scope overrides global in this directory");
        }
    }
    println!("golangci-lint synced to {}", outcome.golangci_lint);
    print_path_hint(&service.path_hint());
    Ok(())
}
