//! Build event types for JSON output.
//!
//! These events are emitted, one JSON object per line, when using
//! `--message-format=json`.
//!
//! # Event Types
//!
//! - `build-started`: The session is about to check the toolchain
//! - `toolchain-verified`: CMake was found and is recent enough
//! - `extension-artifact`: An extension module was produced
//! - `build-finished`: The session ended (success or failure)

use std::path::PathBuf;

use serde::Serialize;

/// A build event emitted during a build session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    /// Session started.
    #[serde(rename = "build-started")]
    BuildStarted {
        /// Package whose extensions are being built
        package: String,
        /// CMake build type
        build_type: String,
        /// Number of extensions to build
        extensions: usize,
    },

    /// The toolchain check passed.
    #[serde(rename = "toolchain-verified")]
    ToolchainVerified {
        /// CMake executable
        program: PathBuf,
        /// Reported version
        version: String,
    },

    /// An extension module was produced.
    #[serde(rename = "extension-artifact")]
    ExtensionArtifact {
        /// Extension (CMake target) name
        target: String,
        /// Output filename
        filename: PathBuf,
    },

    /// Session ended.
    #[serde(rename = "build-finished")]
    BuildFinished {
        /// Whether every extension was built
        success: bool,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// Failure message, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl BuildEvent {
    /// Create a build started event.
    pub fn started(package: impl Into<String>, build_type: impl Into<String>, extensions: usize) -> Self {
        BuildEvent::BuildStarted {
            package: package.into(),
            build_type: build_type.into(),
            extensions,
        }
    }

    /// Create a toolchain verified event.
    pub fn toolchain(program: impl Into<PathBuf>, version: &semver::Version) -> Self {
        BuildEvent::ToolchainVerified {
            program: program.into(),
            version: version.to_string(),
        }
    }

    /// Create an extension artifact event.
    pub fn artifact(target: impl Into<String>, filename: impl Into<PathBuf>) -> Self {
        BuildEvent::ExtensionArtifact {
            target: target.into(),
            filename: filename.into(),
        }
    }

    /// Create a build finished event.
    pub fn finished(duration_ms: u64, error: Option<String>) -> Self {
        BuildEvent::BuildFinished {
            success: error.is_none(),
            duration_ms,
            error,
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_serialization() {
        let event = BuildEvent::artifact("_frankx", "build/lib/_frankx.so");
        let json = event.to_json();
        assert!(json.contains("\"reason\":\"extension-artifact\""));
        assert!(json.contains("\"target\":\"_frankx\""));
        assert!(json.contains("_frankx.so"));
    }

    #[test]
    fn test_finished_serialization() {
        let event = BuildEvent::finished(2340, None);
        let json = event.to_json();
        assert!(json.contains("\"reason\":\"build-finished\""));
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"duration_ms\":2340"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_failed_finish_carries_error() {
        let event = BuildEvent::finished(15, Some("extension `alpha` failed during build".into()));
        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "extension `alpha` failed during build");
    }

    #[test]
    fn test_toolchain_serialization() {
        let event = BuildEvent::toolchain("/usr/bin/cmake", &semver::Version::new(3, 22, 1));
        let json = event.to_json();
        assert!(json.contains("\"reason\":\"toolchain-verified\""));
        assert!(json.contains("\"version\":\"3.22.1\""));
    }
}
