#![warn(clippy::pedantic)]

//! # switcher
//!
//! Manages Go toolchains on one machine. A version can be active globally
//! or pinned per directory tree with a `.switcher-version` file, and each
//! toolchain gets a matching golangci-lint.
//!
//! ## Subcommands
//!
//! - `current` - Show the active version and its source
//! - `list` - List installed (or `--remote`) versions
//! - `install` - Download and install a toolchain
//! - `use` - Activate a toolchain globally or locally
//! - `tools sync` - Install the pinned golangci-lint
//! - `delete` - Remove an installed toolchain
//! - `exec` - Run a tool from the active toolchain (used by shims)
//!
//! ## Examples
//!
//! ```bash
//! switcher use 1.24.2
//! switcher use 1.22 --scope local
//! switcher list --remote
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{current, delete, exec, install, list, tools, use_cmd};
use switcher::SwitcherError;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "SWITCHER_LOG";

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SWITCHER_GIT_COMMIT"),
    ")"
);

/// Go toolchain switcher.
#[derive(Parser)]
#[command(
    name = "switcher",
    author,
    version,
    long_version = LONG_VERSION,
    about = "Go toolchain switcher with per-directory pins",
    after_help = "\
NOTES:
    Local scope uses .switcher-version in the working tree.
    Local scope overrides global scope when both are set.
    Add ~/.switcher/bin to PATH to use the go, gofmt and golangci-lint shims.

ENVIRONMENT VARIABLES:
    SWITCHER_HOME           State directory (default: ~/.switcher)
    SWITCHER_RELEASES_URL   Go release metadata URL
    SWITCHER_GO_DIST        Go archive download base URL
    SWITCHER_LINT_DIST      golangci-lint release download base URL
    SWITCHER_LOG            Log filter (default: warn)"
)]
pub struct Cli {
    /// Log debug output to stderr (overridden by SWITCHER_LOG).
    #[clap(long, short = 'v')]
    pub verbose: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the switcher CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the active Go version and where it is configured.
    Current,

    /// List installed toolchains, marking the active one.
    List(list::ListArgs),

    /// Download and install a Go toolchain.
    Install(install::InstallArgs),

    /// Activate a Go version globally or for the current directory.
    ///
    /// Installs the toolchain when missing and syncs golangci-lint.
    Use(use_cmd::UseArgs),

    /// Manage companion tools.
    Tools(tools::ToolsArgs),

    /// Remove an installed Go toolchain.
    Delete(delete::DeleteArgs),

    /// Run go, gofmt or golangci-lint from the active toolchain.
    Exec(exec::ExecArgs),
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "switcher=debug" } else { "warn" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Handles an error and returns the appropriate exit code.
///
/// For `ProcessExitCode` errors, returns the embedded exit code without
/// printing an error message (the tool already printed its output).
/// For all other errors, prints the error chain and returns exit code 1.
fn handle_error(e: &anyhow::Error) -> i32 {
    if let Some(SwitcherError::ProcessExitCode { code }) = e.downcast_ref::<SwitcherError>() {
        return *code;
    }
    eprintln!("error: {e:#}");
    1
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Current => current::execute(),
        Commands::List(args) => list::execute(&args),
        Commands::Install(args) => install::execute(&args),
        Commands::Use(args) => use_cmd::execute(&args),
        Commands::Tools(args) => tools::execute(&args),
        Commands::Delete(args) => delete::execute(&args),
        Commands::Exec(args) => exec::execute(&args),
    }
}
