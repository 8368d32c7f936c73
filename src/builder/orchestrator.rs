//! Build session orchestration.
//!
//! A session checks the toolchain once, then configures and builds every
//! target strictly in the order given. The first failure ends the session;
//! later targets are never attempted.
//!
//! Targets that share a source directory share one CMake build tree under
//! the staging directory. When the session spans several source trees each
//! gets its own subdirectory, since a CMake cache is bound to one source.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use semver::Version;

use crate::builder::cmake::CMakeBuilder;
use crate::builder::config::BuildConfiguration;
use crate::builder::errors::BuildError;
use crate::builder::events::BuildEvent;
use crate::builder::toolchain::ToolchainProbe;
use crate::core::target::BuildTarget;
use crate::util::fs::ensure_dir;
use crate::util::process::CommandRunner;

/// Lifecycle of a build session.
///
/// `NotStarted -> ToolchainVerified -> AllTargetsBuilt | Failed`. Both end
/// states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    ToolchainVerified,
    AllTargetsBuilt,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::AllTargetsBuilt | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::NotStarted => write!(f, "not started"),
            SessionState::ToolchainVerified => write!(f, "toolchain verified"),
            SessionState::AllTargetsBuilt => write!(f, "all targets built"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}

/// A compiled extension module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltArtifact {
    /// Target the artifact was built from.
    pub target: String,
    /// Where the artifact was written.
    pub path: PathBuf,
}

/// Runs a single build session over a list of targets.
pub struct BuildOrchestrator<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    probe: ToolchainProbe,
    state: SessionState,
    version: Option<Version>,
    events: Option<&'a mut dyn FnMut(BuildEvent)>,
}

impl<'a, R: CommandRunner + ?Sized> BuildOrchestrator<'a, R> {
    pub fn new(runner: &'a R, probe: ToolchainProbe) -> Self {
        BuildOrchestrator {
            runner,
            probe,
            state: SessionState::NotStarted,
            version: None,
            events: None,
        }
    }

    /// Report `toolchain-verified` and `extension-artifact` events to
    /// `sink` as they happen.
    pub fn with_events(mut self, sink: &'a mut dyn FnMut(BuildEvent)) -> Self {
        self.events = Some(sink);
        self
    }

    fn emit(&mut self, event: BuildEvent) {
        if let Some(sink) = self.events.as_mut() {
            sink(event);
        }
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Version found by the toolchain check, once it has passed.
    pub fn toolchain_version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Build every target in order, returning one artifact per target.
    ///
    /// A session runs once; calling this again fails with
    /// [`BuildError::SessionFinished`].
    pub fn build(
        &mut self,
        targets: &[BuildTarget],
        config: &BuildConfiguration,
    ) -> Result<Vec<BuiltArtifact>, BuildError> {
        if self.state != SessionState::NotStarted {
            return Err(BuildError::SessionFinished {
                state: self.state,
            });
        }

        let result = self.run(targets, config);
        self.state = if result.is_ok() {
            SessionState::AllTargetsBuilt
        } else {
            SessionState::Failed
        };
        result
    }

    fn run(
        &mut self,
        targets: &[BuildTarget],
        config: &BuildConfiguration,
    ) -> Result<Vec<BuiltArtifact>, BuildError> {
        let version = self
            .probe
            .check_available(self.runner)
            .map_err(|e| e.for_targets(targets.iter().map(BuildTarget::name)))?;
        self.state = SessionState::ToolchainVerified;
        self.emit(BuildEvent::toolchain(self.probe.program(), &version));
        self.version = Some(version);

        let placements = plan_artifacts(targets, config)?;
        let build_dirs = plan_build_dirs(targets, &config.staging_dir);
        let mut artifacts = Vec::with_capacity(targets.len());

        for ((target, path), build_dir) in targets.iter().zip(placements).zip(build_dirs) {
            let artifact_dir = config.layout.artifact_dir(target.name());

            ensure_dir(&build_dir).map_err(|source| BuildError::Io {
                path: build_dir.clone(),
                source,
            })?;

            let cmake = CMakeBuilder::new(self.runner, self.probe.program(), &build_dir);
            cmake.configure(target, &config.configure_flags(&artifact_dir))?;
            cmake.compile(target, &config.build_type, config.jobs)?;

            if config.verify_artifacts && !path.is_file() {
                return Err(BuildError::ArtifactMissing {
                    name: target.name().to_string(),
                    path,
                });
            }

            tracing::info!("Built `{}` -> {}", target.name(), path.display());
            self.emit(BuildEvent::artifact(target.name(), &path));
            artifacts.push(BuiltArtifact {
                target: target.name().to_string(),
                path,
            });
        }

        Ok(artifacts)
    }
}

/// Compute the artifact path of every target, rejecting collisions.
pub fn plan_artifacts(
    targets: &[BuildTarget],
    config: &BuildConfiguration,
) -> Result<Vec<PathBuf>, BuildError> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    let mut paths = Vec::with_capacity(targets.len());

    for target in targets {
        let path = config.layout.artifact_path(target.name());
        if let Some(first) = seen.get(&path) {
            return Err(BuildError::DuplicateArtifactPath {
                first: first.to_string(),
                second: target.name().to_string(),
                path,
            });
        }
        seen.insert(path.clone(), target.name());
        paths.push(path);
    }

    Ok(paths)
}

/// Pick the CMake build directory of every target.
///
/// When every target comes from one source directory they all build in
/// `staging_dir`. Otherwise each source directory gets
/// `staging_dir/<first target using it>`.
pub fn plan_build_dirs(targets: &[BuildTarget], staging_dir: &Path) -> Vec<PathBuf> {
    let mut trees: Vec<(&Path, &str)> = Vec::new();
    for target in targets {
        if !trees.iter().any(|(source, _)| *source == target.source_dir()) {
            trees.push((target.source_dir(), target.name()));
        }
    }

    if trees.len() <= 1 {
        return vec![staging_dir.to_path_buf(); targets.len()];
    }

    targets
        .iter()
        .map(|target| {
            trees
                .iter()
                .find(|(source, _)| *source == target.source_dir())
                .map_or_else(|| staging_dir.to_path_buf(), |(_, name)| staging_dir.join(name))
        })
        .collect()
}
