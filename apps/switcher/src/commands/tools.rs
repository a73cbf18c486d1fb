//! Tools command for the switcher CLI.
//!
//! ## Usage
//!
//! ```bash
//! switcher tools sync                  # For the active version
//! switcher tools sync --scope global   # For the global version only
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};

use super::{run_with_progress, working_dir};
use switcher::scope::Scope;
use switcher::service::Service;

/// Arguments for the tools command.
#[derive(Args)]
pub struct ToolsArgs {
    #[command(subcommand)]
    pub command: ToolsCommand,
}

#[derive(Subcommand)]
pub enum ToolsCommand {
    /// Install the golangci-lint version pinned for a Go version.
    ///
    /// Repairs missing or outdated pins using the compatibility table.
    Sync {
        /// Sync for the `local` or `global` version instead of the active one.
        #[clap(long)]
        scope: Option<Scope>,
    },
}

/// Executes the tools command.
///
/// # Errors
///
/// Returns an error if no version is configured for the requested scope or
/// the golangci-lint install fails.
pub fn execute(args: &ToolsArgs) -> Result<()> {
    match &args.command {
        ToolsCommand::Sync { scope } => sync(*scope),
    }
}

fn sync(scope: Option<Scope>) -> Result<()> {
    let service = Service::from_env()?;
    let cwd = working_dir()?;

    let synced = run_with_progress(move |reporter, cancel| async move {
        service.sync_tools(&cwd, scope, &cancel, &reporter).await
    })?;

    println!(
        "synced golangci-lint {} for {}",
        synced.golangci_lint, synced.go
    );
    Ok(())
}
