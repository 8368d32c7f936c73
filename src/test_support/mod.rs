//! Test utilities and mocks for berth unit tests.
//!
//! [`MockRunner`] stands in for CMake: it records every invocation and
//! answers with scripted exit codes, so build sessions can be tested without
//! a toolchain installed.
//!
//! # Example
//!
//! ```rust,ignore
//! let runner = MockRunner::new().fail_build_of("alpha", 1);
//! let mut orchestrator = BuildOrchestrator::new(&runner, ToolchainProbe::new("cmake"));
//! let err = orchestrator.build(&targets, &config).unwrap_err();
//! assert_eq!(runner.build_calls().len(), 1);
//! ```

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::builder::errors::Stage;
use crate::util::process::{CommandRunner, ProcessBuilder, ProcessOutput};

/// Version output reported by a default [`MockRunner`].
pub const DEFAULT_CMAKE_OUTPUT: &str = "cmake version 3.22.1\n\nCMake suite maintained and supported by Kitware (kitware.com/cmake).\n";

/// A single recorded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    fn from_builder(cmd: &ProcessBuilder) -> Self {
        Invocation {
            program: cmd.get_program().to_path_buf(),
            args: cmd.get_args().to_vec(),
            cwd: cmd.get_cwd().map(Path::to_path_buf),
        }
    }

    /// Which toolchain step this invocation represents.
    pub fn stage(&self) -> Option<Stage> {
        let first = self.args.first()?;
        if first == "--version" {
            None
        } else if first == "--build" {
            Some(Stage::Build)
        } else {
            Some(Stage::Configure)
        }
    }

    /// Whether this is the version query.
    pub fn is_version_query(&self) -> bool {
        self.args.first().is_some_and(|a| a == "--version")
    }

    /// The `--target` of a build invocation.
    pub fn build_target(&self) -> Option<&str> {
        self.value_after("--target")
    }

    /// The `--config` of a build invocation.
    pub fn build_config(&self) -> Option<&str> {
        self.value_after("--config")
    }

    fn value_after(&self, option: &str) -> Option<&str> {
        let idx = self.args.iter().position(|a| a == option)?;
        self.args.get(idx + 1).and_then(|a| a.to_str())
    }

    /// The source directory of a configure invocation.
    pub fn source_dir(&self) -> Option<&Path> {
        match self.stage() {
            Some(Stage::Configure) => self.args.first().map(Path::new),
            _ => None,
        }
    }

    /// The value of a `-D<KEY>=<VALUE>` flag on a configure invocation.
    pub fn define(&self, key: &str) -> Option<&str> {
        let prefix = format!("-D{}=", key);
        self.args
            .iter()
            .find_map(|a| a.to_str()?.strip_prefix(prefix.as_str()))
    }
}

/// Scripted stand-in for the CMake executable.
#[derive(Debug)]
pub struct MockRunner {
    calls: Mutex<Vec<Invocation>>,
    version: Option<ProcessOutput>,
    configure_failures: Vec<(PathBuf, Option<i32>)>,
    build_failures: Vec<(String, Option<i32>)>,
}

impl MockRunner {
    /// A runner whose CMake reports 3.22.1 and succeeds at everything.
    pub fn new() -> Self {
        MockRunner {
            calls: Mutex::new(Vec::new()),
            version: Some(ProcessOutput {
                code: Some(0),
                stdout: DEFAULT_CMAKE_OUTPUT.to_string(),
                stderr: String::new(),
            }),
            configure_failures: Vec::new(),
            build_failures: Vec::new(),
        }
    }

    /// Report the given text from `cmake --version`.
    pub fn with_version_output(self, stdout: impl Into<String>) -> Self {
        self.with_version(Some(0), stdout)
    }

    /// Report the given exit code and text from `cmake --version`.
    pub fn with_version_exit(self, code: i32, stdout: &str) -> Self {
        self.with_version(Some(code), stdout)
    }

    fn with_version(mut self, code: Option<i32>, stdout: impl Into<String>) -> Self {
        self.version = Some(ProcessOutput {
            code,
            stdout: stdout.into(),
            stderr: String::new(),
        });
        self
    }

    /// Behave as if the CMake executable does not exist.
    pub fn without_toolchain(mut self) -> Self {
        self.version = None;
        self
    }

    /// Make the configure step for `source_dir` exit with `code`.
    pub fn fail_configure_of(mut self, source_dir: impl Into<PathBuf>, code: i32) -> Self {
        self.configure_failures.push((source_dir.into(), Some(code)));
        self
    }

    /// Make the build step for `target` exit with `code`.
    pub fn fail_build_of(mut self, target: impl Into<String>, code: i32) -> Self {
        self.build_failures.push((target.into(), Some(code)));
        self
    }

    /// Make the build step for `target` die from a signal.
    pub fn kill_build_of(mut self, target: impl Into<String>) -> Self {
        self.build_failures.push((target.into(), None));
        self
    }

    /// Every recorded invocation, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded `cmake --version` queries.
    pub fn version_queries(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(Invocation::is_version_query)
            .collect()
    }

    /// Recorded configure invocations.
    pub fn configure_calls(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.stage() == Some(Stage::Configure))
            .collect()
    }

    /// Recorded build invocations.
    pub fn build_calls(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.stage() == Some(Stage::Build))
            .collect()
    }

    fn record(&self, cmd: &ProcessBuilder) -> Invocation {
        let invocation = Invocation::from_builder(cmd);
        self.calls.lock().unwrap().push(invocation.clone());
        invocation
    }

    fn missing(&self, cmd: &ProcessBuilder) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{}: command not found", cmd.get_program().display()),
        )
    }

    fn exit_code_for(&self, invocation: &Invocation) -> Option<i32> {
        match invocation.stage() {
            Some(Stage::Configure) => {
                let source = invocation.source_dir();
                self.configure_failures
                    .iter()
                    .find(|(dir, _)| Some(dir.as_path()) == source)
                    .map_or(Some(0), |(_, code)| *code)
            }
            Some(Stage::Build) => {
                let target = invocation.build_target();
                self.build_failures
                    .iter()
                    .find(|(name, _)| Some(name.as_str()) == target)
                    .map_or(Some(0), |(_, code)| *code)
            }
            None => Some(0),
        }
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for MockRunner {
    fn output(&self, cmd: &ProcessBuilder) -> io::Result<ProcessOutput> {
        let invocation = self.record(cmd);

        if invocation.is_version_query() {
            return self.version.clone().ok_or_else(|| self.missing(cmd));
        }

        if self.version.is_none() {
            return Err(self.missing(cmd));
        }

        Ok(ProcessOutput {
            code: self.exit_code_for(&invocation),
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    fn status(&self, cmd: &ProcessBuilder) -> io::Result<Option<i32>> {
        self.output(cmd).map(|output| output.code)
    }
}
