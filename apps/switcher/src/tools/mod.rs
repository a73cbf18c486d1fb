//! Companion tools pinned per toolchain.
//!
//! - [`compat`] - Go version to golangci-lint version recommendations
//! - [`golangci`] - golangci-lint pin repair and installation

pub mod compat;
pub mod golangci;

pub use compat::recommend;
pub use golangci::LintSync;
