//! Command modules for the switcher CLI.
//!
//! ## Inspection Commands
//!
//! - [`current`] - Show the active Go version and where it comes from
//! - [`list`] - List installed or remote toolchains
//!
//! ## Toolchain Management Commands
//!
//! - [`install`] - Install a toolchain
//! - [`use_cmd`] - Activate a toolchain globally or for a directory
//! - [`delete`] - Remove an installed toolchain
//! - [`tools`] - Sync companion tools
//!
//! ## Shim Support
//!
//! - [`exec`] - Run a tool from the active toolchain
//!
//! Long-running commands run their workflow through a
//! [`ProgressBridge`] and print its events to stderr.

pub mod current;
pub mod delete;
pub mod exec;
pub mod install;
pub mod list;
pub mod tools;
pub mod use_cmd;

use std::future::Future;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use switcher::bridge::{BridgeMessage, ProgressBridge};
use switcher::errors::SwitcherError;
use switcher::progress::{ProgressEvent, Reporter};
use switcher::toolchain::shims::PathHint;

/// Returns the directory commands resolve scopes from.
pub(crate) fn working_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to resolve working directory")
}

/// Runs `work` on a background worker and prints its progress until the
/// result arrives. Ctrl-C cancels the work.
pub(crate) fn run_with_progress<T, F, Fut>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(Reporter, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>>,
{
    let mut bridge = ProgressBridge::spawn_interruptible(work)?;
    let mut printer = ProgressPrinter::new(std::io::stderr().is_terminal());

    while let Some(message) = bridge.next() {
        match message {
            BridgeMessage::Event(event) => printer.show(&event),
            BridgeMessage::Finished(result) => {
                printer.finish();
                return result;
            }
        }
    }
    Err(SwitcherError::WorkerLost.into())
}

/// Prints the PATH setup hint when the shims directory is not on `PATH`.
pub(crate) fn print_path_hint(hint: &PathHint) {
    if !hint.on_path {
        println!("add {} to PATH to use shims", hint.bin_dir.display());
    }
}

/// Writes progress events to stderr.
///
/// Byte counters redraw a single line and are only shown on a terminal.
struct ProgressPrinter {
    interactive: bool,
    transfer_line_open: bool,
}

impl ProgressPrinter {
    const fn new(interactive: bool) -> Self {
        Self {
            interactive,
            transfer_line_open: false,
        }
    }

    fn show(&mut self, event: &ProgressEvent) {
        let mut stderr = std::io::stderr().lock();
        if event.is_transfer() {
            if !self.interactive {
                return;
            }
            let _ = write!(stderr, "\r\x1b[2K{event}");
            self.transfer_line_open = true;
        } else {
            if self.transfer_line_open {
                let _ = writeln!(stderr);
                self.transfer_line_open = false;
            }
            let _ = writeln!(stderr, "{event}");
        }
        let _ = stderr.flush();
    }

    fn finish(&mut self) {
        if self.transfer_line_open {
            eprintln!();
            self.transfer_line_open = false;
        }
    }
}
