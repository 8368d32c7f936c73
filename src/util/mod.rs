//! Shared utilities

pub mod diagnostic;
pub mod fs;
pub mod process;

pub use diagnostic::Diagnostic;
pub use process::{CommandRunner, ProcessBuilder, SystemRunner};
