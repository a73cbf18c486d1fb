//! List command for the switcher CLI.
//!
//! Displays installed toolchains with the active one marked, or the
//! versions available for download on this platform.
//!
//! ## Usage
//!
//! ```bash
//! switcher list            # Installed toolchains
//! switcher list --remote   # Installable releases
//! switcher list --json     # Machine-readable output
//! ```
//!
//! ## Output Format
//!
//! ```text
//! * go1.24.2
//!   go1.22.5
//! ```

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::{run_with_progress, working_dir};
use switcher::errors::is_no_active_version;
use switcher::progress::Stage;
use switcher::service::Service;
use switcher::version::GoVersion;

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// List versions available for download instead of installed ones.
    #[clap(long)]
    pub remote: bool,

    /// Print the list as JSON.
    #[clap(long, short = 'j')]
    pub json: bool,
}

/// One entry of the JSON output.
#[derive(Debug, Serialize)]
struct ListEntry {
    version: GoVersion,
    active: bool,
}

/// Executes the list command.
///
/// # Errors
///
/// Returns an error if the toolchains directory, the active version, or the
/// remote release metadata cannot be read.
pub fn execute(args: &ListArgs) -> Result<()> {
    let service = Service::from_env()?;

    if args.remote {
        let versions = run_with_progress(move |reporter, cancel| async move {
            reporter.step(Stage::ReleaseFetch, "Fetching release metadata");
            service.list_remote(&cancel).await
        })?;
        let entries: Vec<ListEntry> = versions
            .into_iter()
            .map(|version| ListEntry {
                version,
                active: false,
            })
            .collect();
        return print_entries(&entries, args.json, "no remote versions found for this platform");
    }

    let cwd = working_dir()?;
    let installed = service.list_local()?;
    let active = match service.current(&cwd) {
        Ok(active) => Some(active.version),
        Err(err) if is_no_active_version(&err) => None,
        Err(err) => return Err(err),
    };

    let entries: Vec<ListEntry> = installed
        .into_iter()
        .map(|version| ListEntry {
            version,
            active: active == Some(version),
        })
        .collect();
    print_entries(&entries, args.json, "no local toolchains installed")
}

fn print_entries(entries: &[ListEntry], json: bool, empty_message: &str) -> Result<()> {
    if json {
        let encoded =
            serde_json::to_string_pretty(entries).context("Failed to encode version list")?;
        println!("{encoded}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("{empty_message}");
        return Ok(());
    }
    for entry in entries {
        let marker = if entry.active { "*" } else { " " };
        println!("{marker} {}", entry.version);
    }
    Ok(())
}
