//! Build session error types and diagnostics.

use std::fmt;
use std::io;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::builder::orchestrator::SessionState;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// The toolchain step a target was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    Build,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Configure => write!(f, "configure"),
            Stage::Build => write!(f, "build"),
        }
    }
}

/// Error raised by a build session.
///
/// None of these are retried: the session stops at the first one.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BuildError {
    #[error("`{}` could not be run ({reason}){}", .tool.display(), needed_by(.targets))]
    #[diagnostic(code(berth::toolchain::missing), help("Install CMake >= 3.10 and ensure it's in your PATH"))]
    ToolchainMissing {
        tool: PathBuf,
        reason: String,
        targets: Vec<String>,
    },

    #[error("CMake >= {required} is required, found {found}")]
    #[diagnostic(code(berth::toolchain::too_old), help("Upgrade CMake to 3.10 or newer"))]
    ToolchainVersionTooOld {
        found: semver::Version,
        required: semver::Version,
    },

    #[error("extension `{name}` failed during {stage} ({})", describe_exit(.exit_code))]
    #[diagnostic(code(berth::build::target_failed), help("Re-run with --verbose to see the CMake commands"))]
    BuildTargetFailed {
        name: String,
        stage: Stage,
        exit_code: Option<i32>,
    },

    #[error("extensions `{first}` and `{second}` would both be written to {}", .path.display())]
    #[diagnostic(
        code(berth::build::duplicate_artifact),
        help("Give every [[extension]] a distinct name")
    )]
    DuplicateArtifactPath {
        first: String,
        second: String,
        path: PathBuf,
    },

    #[error("extension `{name}` built successfully but {} was not produced", .path.display())]
    #[diagnostic(
        code(berth::build::artifact_missing),
        help("Check that the CMake target's output name and suffix match the extension name")
    )]
    ArtifactMissing { name: String, path: PathBuf },

    #[error("failed to spawn `{}`", .program.display())]
    #[diagnostic(code(berth::process::spawn))]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create directory {}", .path.display())]
    #[diagnostic(code(berth::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("build session already finished ({state}); start a new session")]
    #[diagnostic(code(berth::session::finished))]
    SessionFinished { state: SessionState },
}

fn needed_by(targets: &[String]) -> String {
    if targets.is_empty() {
        String::new()
    } else {
        format!(
            "; CMake must be installed to build the following extensions: {}",
            targets.join(", ")
        )
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl BuildError {
    /// Attach the names of the extensions that needed a missing toolchain.
    pub fn for_targets<'a>(self, names: impl IntoIterator<Item = &'a str>) -> Self {
        match self {
            BuildError::ToolchainMissing { tool, reason, .. } => BuildError::ToolchainMissing {
                tool,
                reason,
                targets: names.into_iter().map(str::to_string).collect(),
            },
            other => other,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());

        match self {
            BuildError::ToolchainMissing { .. } => {
                diag.with_suggestion(suggestions::INSTALL_CMAKE)
            }
            BuildError::ToolchainVersionTooOld { found, required } => diag
                .with_context(format!("found CMake {}, need at least {}", found, required))
                .with_suggestion(suggestions::UPGRADE_CMAKE),
            BuildError::BuildTargetFailed { stage, .. } => diag
                .with_context(format!("stage: {}", stage))
                .with_context("remaining extensions were not built")
                .with_suggestion(suggestions::BUILD_FAILED),
            BuildError::DuplicateArtifactPath { .. } => {
                diag.with_suggestion("Give every [[extension]] a distinct name")
            }
            BuildError::ArtifactMissing { path, .. } => diag.with_location(path.clone()),
            BuildError::Spawn { source, .. } | BuildError::Io { source, .. } => {
                diag.with_context(source.to_string())
            }
            BuildError::SessionFinished { .. } => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_failed_message() {
        let err = BuildError::BuildTargetFailed {
            name: "alpha".to_string(),
            stage: Stage::Build,
            exit_code: Some(1),
        };
        assert_eq!(
            err.to_string(),
            "extension `alpha` failed during build (exit code 1)"
        );
    }

    #[test]
    fn test_signal_exit_message() {
        let err = BuildError::BuildTargetFailed {
            name: "alpha".to_string(),
            stage: Stage::Configure,
            exit_code: None,
        };
        assert!(err.to_string().contains("configure (terminated by signal)"));
    }

    #[test]
    fn test_missing_toolchain_names_extensions() {
        let err = BuildError::ToolchainMissing {
            tool: PathBuf::from("cmake"),
            reason: "not found".to_string(),
            targets: Vec::new(),
        }
        .for_targets(["_frankx", "pyaffx"]);

        let message = err.to_string();
        assert!(message.contains("`cmake` could not be run (not found)"));
        assert!(message.ends_with("_frankx, pyaffx"));
    }

    #[test]
    fn test_missing_toolchain_without_targets() {
        let err = BuildError::ToolchainMissing {
            tool: PathBuf::from("/opt/cmake/bin/cmake"),
            reason: "No such file or directory".to_string(),
            targets: Vec::new(),
        };

        assert_eq!(
            err.to_string(),
            "`/opt/cmake/bin/cmake` could not be run (No such file or directory)"
        );
    }

    #[test]
    fn test_for_targets_leaves_other_errors_alone() {
        let err = BuildError::ToolchainVersionTooOld {
            found: semver::Version::new(3, 5, 1),
            required: semver::Version::new(3, 10, 0),
        }
        .for_targets(["alpha"]);

        assert_eq!(err.to_string(), "CMake >= 3.10.0 is required, found 3.5.1");
    }

    #[test]
    fn test_diagnostic_includes_stage() {
        let err = BuildError::BuildTargetFailed {
            name: "beta".to_string(),
            stage: Stage::Configure,
            exit_code: Some(2),
        };
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("stage: configure"));
        assert!(output.contains("help: consider:"));
    }
}
