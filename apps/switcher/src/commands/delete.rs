//! Delete command for the switcher CLI.
//!
//! Removes an installed toolchain. When the deleted version was active, the
//! same scope moves to the newest remaining toolchain, or is cleared if
//! none remain.
//!
//! ## Usage
//!
//! ```bash
//! switcher delete 1.22.5
//! ```

use anyhow::Result;
use clap::Args;

use super::{run_with_progress, working_dir};
use switcher::service::Service;

/// Arguments for the delete command.
#[derive(Args)]
pub struct DeleteArgs {
    /// Installed Go version to remove.
    pub version: String,
}

/// Executes the delete command.
///
/// # Errors
///
/// Returns an error if the version is invalid or not installed, or the
/// toolchain or state cannot be updated.
pub fn execute(args: &DeleteArgs) -> Result<()> {
    let service = Service::from_env()?;
    let cwd = working_dir()?;
    let version = args.version.clone();

    let result = run_with_progress(move |reporter, cancel| async move {
        service
            .delete_installed(&cwd, &version, &cancel, &reporter)
            .await
    })?;

    println!("deleted {}", result.deleted_version);
    if result.was_active {
        match &result.active_after {
            Some(active) if result.switched_to_newest => {
                println!("switched {} version to {}", active.scope, active.version);
            }
            Some(active) => {
                println!("active version is now {} ({})", active.version, active.scope);
            }
            None => println!("no active Go version configured"),
        }
    }
    if let Some(warning) = &result.tool_sync_warning {
        eprintln!("warning: golangci-lint sync failed: {warning}");
    }
    Ok(())
}
