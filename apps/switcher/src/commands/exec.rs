//! Exec command for the switcher CLI.
//!
//! Runs `go`, `gofmt` or `golangci-lint` from the version active in the
//! current directory. The shims in `bin/` call this command, so it never
//! prints anything of its own on success.
//!
//! ## Usage
//!
//! ```bash
//! switcher exec go build ./...
//! switcher exec golangci-lint run
//! ```

use std::process::Command;

use anyhow::{Context, Result};
use clap::Args;

use super::working_dir;
use switcher::errors::SwitcherError;
use switcher::service::Service;

/// Arguments for the exec command.
#[derive(Args)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct ExecArgs {
    /// Tool to run: `go`, `gofmt` or `golangci-lint`.
    pub tool: String,

    /// Arguments passed through to the tool.
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Executes the exec command.
///
/// Returns `Err(SwitcherError::ProcessExitCode)` if the tool exits with a
/// non-zero code, so `main` can exit with the same code.
///
/// # Errors
///
/// Returns an error if the tool cannot be resolved or started.
pub fn execute(args: &ExecArgs) -> Result<()> {
    let service = Service::from_env()?;
    let cwd = working_dir()?;
    let binary = service.resolve_binary_for_tool(&cwd, &args.tool)?;
    tracing::debug!(tool = %args.tool, binary = %binary.display(), "running tool");

    let status = Command::new(&binary)
        .args(&args.args)
        .status()
        .with_context(|| format!("Failed to run {}", binary.display()))?;

    if status.success() {
        Ok(())
    } else {
        Err(SwitcherError::process_exit_code(exit_code(status)).into())
    }
}

#[cfg(unix)]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
