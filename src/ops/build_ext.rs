//! Build every extension declared in a manifest.
//!
//! This is the entry point packaging tools call: it turns the manifest,
//! command-line options and environment into a [`BuildConfiguration`],
//! runs a single build session and hands back either the artifacts or a
//! fatal error.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use semver::Version;

use crate::builder::config::{default_ext_suffix, BuildConfiguration, BuildType, OutputLayout};
use crate::builder::errors::BuildError;
use crate::builder::events::BuildEvent;
use crate::builder::orchestrator::{BuildOrchestrator, BuiltArtifact};
use crate::builder::toolchain::ToolchainProbe;
use crate::core::manifest::Manifest;
use crate::core::target::is_cmake_project;
use crate::util::diagnostic::suggestions;
use crate::util::fs::absolute_from;
use crate::util::process::{find_interpreter, CommandRunner};

/// Options for building extensions.
#[derive(Debug, Clone, Default)]
pub struct BuildExtOptions {
    /// Root of the importable output tree (default: `<root>/build/lib`)
    pub build_lib: Option<PathBuf>,

    /// Staging directory for CMake (default: `<root>/build/temp`)
    pub build_temp: Option<PathBuf>,

    /// Extension module filename suffix (default: platform specific)
    pub ext_suffix: Option<String>,

    /// Interpreter forwarded to CMake (default: python3/python from PATH)
    pub interpreter: Option<PathBuf>,

    /// CMake executable (default: cmake from PATH)
    pub cmake: Option<PathBuf>,

    /// Build type override; when unset `BUILD_TYPE` is consulted
    pub build_type: Option<String>,

    /// Parallel jobs forwarded to `cmake --build`
    pub jobs: Option<usize>,

    /// Skip checking that each artifact exists after its build
    pub no_verify: bool,
}

/// Outcome of a build session.
#[derive(Debug)]
pub struct BuildExtReport {
    /// The session's configuration.
    pub config: BuildConfiguration,
    /// CMake that was probed.
    pub cmake: PathBuf,
    /// Version reported by CMake, if the toolchain check got that far.
    pub toolchain_version: Option<Version>,
    /// Artifacts, or the error that stopped the session.
    pub result: Result<Vec<BuiltArtifact>, BuildError>,
}

impl BuildExtReport {
    /// Convert a failed session into a fatal error.
    pub fn into_result(self) -> Result<Vec<BuiltArtifact>> {
        self.result.map_err(anyhow::Error::from)
    }
}

/// Derive the session configuration. The build type is read here, once.
pub fn build_configuration(
    manifest: &Manifest,
    opts: &BuildExtOptions,
    cwd: &Path,
) -> Result<BuildConfiguration> {
    let settings = manifest.build_settings();
    let default_type = settings.default_build_type();
    let build_type = match opts.build_type.as_deref() {
        Some(value) => BuildType::resolve(Some(value), default_type),
        None => BuildType::from_env(default_type),
    };

    let root = manifest.root();
    let build_lib = opts
        .build_lib
        .as_deref()
        .map(|p| absolute_from(p, cwd))
        .unwrap_or_else(|| root.join("build").join("lib"));
    let build_temp = opts
        .build_temp
        .as_deref()
        .map(|p| absolute_from(p, cwd))
        .unwrap_or_else(|| root.join("build").join("temp"));
    let ext_suffix = opts
        .ext_suffix
        .clone()
        .unwrap_or_else(|| default_ext_suffix().to_string());

    let interpreter = match opts.interpreter.as_deref() {
        Some(path) => absolute_from(path, cwd),
        None => find_interpreter().with_context(|| {
            format!("no Python interpreter found in PATH\n{}", suggestions::NO_INTERPRETER)
        })?,
    };

    let mut config = BuildConfiguration::new(
        OutputLayout::new(build_lib, ext_suffix),
        build_temp,
        interpreter,
        manifest.package().version.clone(),
    )
    .with_build_type(build_type)
    .with_extra_flags(manifest.extra_flags().iter().cloned())
    .with_jobs(opts.jobs)
    .verify_artifacts(!opts.no_verify);

    config.install_rpath = settings.install_rpath.clone();
    config.position_independent_code = settings.position_independent_code;

    Ok(config)
}

/// Build every extension in `manifest`, in declaration order.
pub fn build_ext<R>(manifest: &Manifest, opts: &BuildExtOptions, runner: &R) -> Result<BuildExtReport>
where
    R: CommandRunner + ?Sized,
{
    build_ext_with_events(manifest, opts, runner, &mut |_: BuildEvent| {})
}

/// Like [`build_ext`], reporting [`BuildEvent`]s to `events` as the session
/// progresses.
///
/// `build-started` is sent once the configuration is known, and
/// `build-finished` when the session ends, whatever its outcome.
pub fn build_ext_with_events<R>(
    manifest: &Manifest,
    opts: &BuildExtOptions,
    runner: &R,
    events: &mut dyn FnMut(BuildEvent),
) -> Result<BuildExtReport>
where
    R: CommandRunner + ?Sized,
{
    let start = Instant::now();
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    tracing::debug!("using manifest {}", manifest.path().display());
    let config = build_configuration(manifest, opts, &cwd)?;

    for target in manifest.targets() {
        if !is_cmake_project(target.source_dir()) {
            tracing::warn!(
                "no CMakeLists.txt in {} (extension `{}`)",
                target.source_dir().display(),
                target.name()
            );
        }
    }

    let probe = match opts.cmake.as_deref() {
        Some(path) => ToolchainProbe::new(absolute_from(path, &cwd)),
        None => ToolchainProbe::cmake(),
    };
    let cmake = probe.program().to_path_buf();

    tracing::info!(
        "Building {} extension(s) for {} v{} ({})",
        manifest.targets().len(),
        manifest.package().name,
        manifest.package().version,
        config.build_type
    );
    events(BuildEvent::started(
        &manifest.package().name,
        config.build_type.as_str(),
        manifest.targets().len(),
    ));

    let (result, toolchain_version) = {
        let mut orchestrator = BuildOrchestrator::new(runner, probe).with_events(&mut *events);
        let result = orchestrator.build(manifest.targets(), &config);
        (result, orchestrator.toolchain_version().cloned())
    };

    let error = result.as_ref().err().map(ToString::to_string);
    events(BuildEvent::finished(start.elapsed().as_millis() as u64, error));

    Ok(BuildExtReport {
        config,
        cmake,
        toolchain_version,
        result,
    })
}
