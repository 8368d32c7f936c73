//! Subprocess execution utilities.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Builder for subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Get the working directory, if one was set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands on behalf of the builder.
///
/// All toolchain invocations go through this trait so the build session can
/// be exercised without a real CMake installation.
pub trait CommandRunner {
    /// Run to completion, capturing stdout and stderr.
    fn output(&self, cmd: &ProcessBuilder) -> io::Result<ProcessOutput>;

    /// Run to completion, returning the exit code.
    ///
    /// Output is not captured: the child inherits stderr and its stdout is
    /// redirected to stderr, keeping stdout free for build events.
    fn status(&self, cmd: &ProcessBuilder) -> io::Result<Option<i32>>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, cmd: &ProcessBuilder) -> io::Result<ProcessOutput> {
        tracing::debug!("running `{}`", cmd.display_command());

        let output = cmd
            .build_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn status(&self, cmd: &ProcessBuilder) -> io::Result<Option<i32>> {
        tracing::debug!("running `{}`", cmd.display_command());

        let status = cmd
            .build_command()
            .stdin(Stdio::null())
            .stdout(io::stderr())
            .status()?;
        Ok(status.code())
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find CMake.
pub fn find_cmake() -> Option<PathBuf> {
    find_executable("cmake")
}

/// Find a Python interpreter to hand to CMake.
pub fn find_interpreter() -> Option<PathBuf> {
    // Check PYTHON environment variable first
    if let Ok(python) = std::env::var("PYTHON") {
        if let Some(path) = find_executable(&python) {
            return Some(path);
        }
    }

    for interpreter in &["python3", "python"] {
        if let Some(path) = find_executable(interpreter) {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_system_runner_output() {
        let output = SystemRunner
            .output(&ProcessBuilder::new("echo").arg("hello"))
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_exit_code() {
        let code = SystemRunner
            .status(&ProcessBuilder::new("sh").args(["-c", "exit 3"]))
            .unwrap();

        assert_eq!(code, Some(3));
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let err = SystemRunner
            .output(&ProcessBuilder::new("berth-definitely-not-a-real-tool"))
            .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("cmake").args(["--build", ".", "--target", "alpha"]);

        assert_eq!(pb.display_command(), "cmake --build . --target alpha");
    }

    #[cfg(unix)]
    #[test]
    fn test_args_keep_non_utf8_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"/tmp/caf\xe9");
        let pb = ProcessBuilder::new("cmake").arg(raw).args([raw]);

        assert_eq!(pb.get_args()[0].as_bytes(), b"/tmp/caf\xe9");
        assert_eq!(pb.get_args()[1].as_bytes(), b"/tmp/caf\xe9");
    }

    #[test]
    fn test_cwd_is_recorded() {
        let pb = ProcessBuilder::new("cmake").cwd("/tmp/stage");
        assert_eq!(pb.get_cwd(), Some(Path::new("/tmp/stage")));
    }
}
