//! High-level operations
//!
//! These are the entry points behind the CLI commands.

pub mod build_ext;

pub use build_ext::{build_ext, build_ext_with_events, BuildExtOptions, BuildExtReport};
