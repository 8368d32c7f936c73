//! CMake configure and build invocations.

use std::path::PathBuf;

use crate::builder::config::{BuildType, CMakeFlag};
use crate::builder::errors::{BuildError, Stage};
use crate::core::target::BuildTarget;
use crate::util::process::{CommandRunner, ProcessBuilder};

/// Drives one CMake executable inside a staging directory.
pub struct CMakeBuilder<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    program: PathBuf,
    build_dir: PathBuf,
}

impl<'a, R: CommandRunner + ?Sized> CMakeBuilder<'a, R> {
    /// Create a builder running `program` in `build_dir`.
    pub fn new(runner: &'a R, program: impl Into<PathBuf>, build_dir: impl Into<PathBuf>) -> Self {
        CMakeBuilder {
            runner,
            program: program.into(),
            build_dir: build_dir.into(),
        }
    }

    /// `cmake <source_dir> -D...` run from the staging directory.
    pub fn configure_command(&self, target: &BuildTarget, flags: &[CMakeFlag]) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
            .arg(target.source_dir())
            .args(flags.iter().map(CMakeFlag::to_arg))
            .cwd(&self.build_dir)
    }

    /// `cmake --build . --target <name> --config <type>` run from the
    /// staging directory.
    pub fn build_command(
        &self,
        target: &BuildTarget,
        build_type: &BuildType,
        jobs: Option<usize>,
    ) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.program)
            .args(["--build", "."])
            .arg("--target")
            .arg(target.name())
            // Configuration (for multi-config generators like Visual Studio)
            .arg("--config")
            .arg(build_type.as_str());

        if let Some(jobs) = jobs {
            cmd = cmd.arg("--parallel").arg(jobs.to_string());
        }

        cmd.cwd(&self.build_dir)
    }

    /// Run the configure step for `target`.
    pub fn configure(&self, target: &BuildTarget, flags: &[CMakeFlag]) -> Result<(), BuildError> {
        tracing::info!("Configuring `{}` from {}", target.name(), target.source_dir().display());
        self.run(target, Stage::Configure, self.configure_command(target, flags))
    }

    /// Run the build step for `target`.
    pub fn compile(
        &self,
        target: &BuildTarget,
        build_type: &BuildType,
        jobs: Option<usize>,
    ) -> Result<(), BuildError> {
        tracing::info!("Building `{}` ({})", target.name(), build_type);
        self.run(target, Stage::Build, self.build_command(target, build_type, jobs))
    }

    fn run(&self, target: &BuildTarget, stage: Stage, cmd: ProcessBuilder) -> Result<(), BuildError> {
        tracing::debug!("{}: `{}`", stage, cmd.display_command());

        let code = self.runner.status(&cmd).map_err(|source| BuildError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if code != Some(0) {
            return Err(BuildError::BuildTargetFailed {
                name: target.name().to_string(),
                stage,
                exit_code: code,
            });
        }

        Ok(())
    }
}
