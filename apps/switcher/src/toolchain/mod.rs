//! Toolchain storage and acquisition.
//!
//! ## Module Structure
//!
//! - [`platform`] - Go `GOOS`/`GOARCH` detection
//! - [`paths`] - Directory layout under the switcher home
//! - [`releases`] - Release metadata, endpoints and archive selection
//! - [`download`] - Streaming HTTP downloads with cancellation
//! - [`verify`] - SHA-256 checksum verification
//! - [`cache`] - Verified download cache
//! - [`archive`] - Safe tar.gz extraction
//! - [`shims`] - Command shims and the PATH hint

pub mod archive;
pub mod cache;
pub mod download;
pub mod paths;
pub mod platform;
pub mod releases;
pub mod shims;
pub mod verify;

pub use paths::SwitcherPaths;
pub use platform::Platform;
pub use releases::{Endpoints, HttpReleaseClient, Release, ReleaseFile, ReleaseSource};
