//! Berth - builds native extension modules with CMake for packaging tools
//!
//! This crate provides the core library functionality for berth,
//! including toolchain checks, build sessions and manifest handling.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for berth unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a scripted stand-in for the CMake executable.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildConfiguration, BuildError, BuildOrchestrator, ToolchainProbe};
pub use core::{manifest::Manifest, target::BuildTarget};
pub use ops::{build_ext, BuildExtOptions};
