//! Current command for the switcher CLI.
//!
//! ## Usage
//!
//! ```bash
//! switcher current
//! ```
//!
//! ## Output Format
//!
//! ```text
//! go1.24.2 (local)
//! source: /home/me/project/.switcher-version
//! ```

use anyhow::Result;

use super::working_dir;
use switcher::errors::is_no_active_version;
use switcher::service::Service;

/// Executes the current command.
///
/// Having no active version is reported on stdout and is not an error.
///
/// # Errors
///
/// Returns an error if a pin file or `config.json` cannot be read.
pub fn execute() -> Result<()> {
    let service = Service::from_env()?;
    let cwd = working_dir()?;

    match service.current(&cwd) {
        Ok(active) => {
            println!("{} ({})", active.version, active.scope);
            println!("source: {}", active.source.display());
            Ok(())
        }
        Err(err) if is_no_active_version(&err) => {
            println!("no active Go version configured");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
