//! Core data structures for berth.
//!
//! - Build targets (one per native extension)
//! - The Berth.toml manifest

pub mod manifest;
pub mod target;

pub use manifest::{find_manifest, Manifest, MANIFEST_NAME};
pub use target::BuildTarget;
