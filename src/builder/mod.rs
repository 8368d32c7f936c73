//! CMake extension build system.
//!
//! This module probes the CMake toolchain and drives configure/build steps
//! for each extension in a build session.

pub mod cmake;
pub mod config;
pub mod errors;
pub mod events;
pub mod orchestrator;
pub mod toolchain;

pub use cmake::CMakeBuilder;
pub use config::{BuildConfiguration, BuildType, CMakeFlag, FlagValue, OutputLayout};
pub use errors::{BuildError, Stage};
pub use events::BuildEvent;
pub use orchestrator::{BuildOrchestrator, BuiltArtifact, SessionState};
pub use toolchain::{ToolchainProbe, MIN_CMAKE_VERSION};
