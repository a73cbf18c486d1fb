#![warn(clippy::pedantic)]

//! Go toolchain management for the `switcher` CLI.
//!
//! The library holds the state-and-installation engine: version
//! normalization, scope resolution, `config.json` persistence, the archive
//! download/verify/extract pipeline, the golangci-lint compatibility table,
//! and the progress bridge that runs workflows on a background worker.
//!
//! ## Module Structure
//!
//! - [`version`] - Go and dotted version parsing and comparison
//! - [`config`] - The persisted state document
//! - [`scope`] - Local/global active version resolution
//! - [`toolchain`] - Layout, releases, downloads, extraction and shims
//! - [`tools`] - golangci-lint recommendations and installs
//! - [`progress`] / [`bridge`] - Progress events and the worker bridge
//! - [`service`] - Install, use, sync and delete workflows

pub mod bridge;
pub mod config;
pub mod errors;
pub mod fsutil;
pub mod progress;
pub mod scope;
pub mod service;
pub mod toolchain;
pub mod tools;
pub mod version;

/// HTTP server and archive fixtures for unit tests.
#[cfg(test)]
pub mod test_support;

pub use errors::SwitcherError;
pub use service::Service;
pub use version::GoVersion;
