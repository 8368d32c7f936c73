//! CMake toolchain detection.
//!
//! The probe runs `cmake --version` once per build session and fails fast
//! when CMake is missing or older than [`MIN_CMAKE_VERSION`].

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use semver::Version;

use crate::builder::errors::BuildError;
use crate::util::process::{find_cmake, CommandRunner, ProcessBuilder};

/// Oldest CMake the configure flags are known to work with.
pub const MIN_CMAKE_VERSION: Version = Version::new(3, 10, 0);

/// Checks that CMake can be invoked and is recent enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainProbe {
    program: PathBuf,
    minimum: Version,
}

impl ToolchainProbe {
    /// Create a probe for the given CMake executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        ToolchainProbe {
            program: program.into(),
            minimum: MIN_CMAKE_VERSION,
        }
    }

    /// Probe the `cmake` found in PATH, falling back to the bare name so the
    /// failure is reported by [`check_available`](Self::check_available).
    pub fn cmake() -> Self {
        Self::new(find_cmake().unwrap_or_else(|| PathBuf::from("cmake")))
    }

    /// The CMake executable this probe runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The minimum accepted version.
    pub fn minimum(&self) -> &Version {
        &self.minimum
    }

    /// Run `cmake --version` and validate the reported version.
    pub fn check_available<R>(&self, runner: &R) -> Result<Version, BuildError>
    where
        R: CommandRunner + ?Sized,
    {
        let cmd = ProcessBuilder::new(&self.program).arg("--version");

        let output = runner.output(&cmd).map_err(|e| BuildError::ToolchainMissing {
            tool: self.program.clone(),
            reason: e.to_string(),
            targets: Vec::new(),
        })?;

        let Some(version) = parse_cmake_version(&output.stdout) else {
            let reason = match output.code {
                Some(0) => "no version in `--version` output".to_string(),
                Some(code) => format!("`--version` exited with code {}", code),
                None => "`--version` was terminated by a signal".to_string(),
            };
            return Err(BuildError::ToolchainMissing {
                tool: self.program.clone(),
                reason,
                targets: Vec::new(),
            });
        };

        if !output.success() {
            tracing::warn!(
                "`{}` exited with {:?} but reported version {}",
                cmd.display_command(),
                output.code,
                version
            );
        }

        if version < self.minimum {
            return Err(BuildError::ToolchainVersionTooOld {
                found: version,
                required: self.minimum.clone(),
            });
        }

        tracing::info!("Using CMake {} ({})", version, self.program.display());
        Ok(version)
    }
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"version\s*([\d.]+)").expect("version pattern is valid"))
}

/// Extract the version from `cmake --version` output.
///
/// Handles output such as `cmake version 3.20.5`, `cmake3 version 3.10.2`
/// and `cmake version 3.28.0-rc1`.
pub fn parse_cmake_version(output: &str) -> Option<Version> {
    let captures = version_regex().captures(output)?;
    parse_version_flexible(captures.get(1)?.as_str())
}

/// Parse a version string into semver::Version, handling incomplete versions.
///
/// Handles versions like "3.20.5", "3.10" or "3.10.0.1"; missing components
/// are zero and components past the patch level are ignored.
pub fn parse_version_flexible(version_str: &str) -> Option<Version> {
    let clean_version = version_str
        .trim()
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .next()
        .unwrap_or(version_str);

    let mut parts = clean_version.split('.');
    let major = parts.next().and_then(|s| s.parse().ok())?;
    let minor = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);

    Some(Version::new(major, minor, patch))
}
