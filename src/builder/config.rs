//! Per-session build configuration and CMake flag policy.
//!
//! A [`BuildConfiguration`] is derived once at the start of a session and
//! never re-read. The configure flags it produces are kept as typed
//! key/value pairs until they are rendered at the process boundary.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Result};

use crate::util::fs::dir_arg;

/// Environment variable overriding the build type for a whole session.
pub const BUILD_TYPE_ENV: &str = "BUILD_TYPE";

/// Default runtime search path: the directory of the loading artifact.
pub const DEFAULT_INSTALL_RPATH: &str = "$ORIGIN";

/// Configure keys owned by the build policy; user flags may not set them.
pub const POLICY_KEYS: &[&str] = &[
    "CMAKE_LIBRARY_OUTPUT_DIRECTORY",
    "PYTHON_EXECUTABLE",
    "EXAMPLE_VERSION_INFO",
    "CMAKE_BUILD_TYPE",
    "USE_PYTHON_EXTENSION",
    "BUILD_EXAMPLES",
    "BUILD_TESTS",
    "BUILD_SHARED_LIBS",
    "CMAKE_BUILD_WITH_INSTALL_RPATH",
    "CMAKE_INSTALL_RPATH",
    "CMAKE_POSITION_INDEPENDENT_CODE",
];

/// CMake build type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
    /// A project-defined build type, passed through verbatim.
    Other(String),
}

impl BuildType {
    /// Resolve the build type from an optional override, falling back to
    /// `default` when the override is unset or blank.
    pub fn resolve(value: Option<&str>, default: BuildType) -> BuildType {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => v.parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Read [`BUILD_TYPE_ENV`] from the process environment.
    pub fn from_env(default: BuildType) -> BuildType {
        let value = std::env::var(BUILD_TYPE_ENV).ok();
        Self::resolve(value.as_deref(), default)
    }

    /// The name CMake expects.
    pub fn as_str(&self) -> &str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
            BuildType::Other(name) => name,
        }
    }
}

impl FromStr for BuildType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "debug" => BuildType::Debug,
            "release" => BuildType::Release,
            "relwithdebinfo" => BuildType::RelWithDebInfo,
            "minsizerel" => BuildType::MinSizeRel,
            _ => {
                tracing::warn!("unknown build type `{}`, passing it to CMake as-is", s);
                BuildType::Other(s.to_string())
            }
        })
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a `-D<KEY>=<VALUE>` configure flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Str(String),
    Path(PathBuf),
    /// A directory, rendered with a trailing separator.
    Directory(PathBuf),
    /// Rendered as `ON` / `OFF`.
    Switch(bool),
    /// Rendered as `TRUE` / `FALSE`.
    Bool(bool),
}

impl FlagValue {
    /// Render the value as passed to CMake. Paths keep their exact bytes.
    pub fn to_os_string(&self) -> OsString {
        match self {
            FlagValue::Str(s) => OsString::from(s),
            FlagValue::Path(p) => p.clone().into_os_string(),
            FlagValue::Directory(p) => dir_arg(p),
            FlagValue::Switch(true) => OsString::from("ON"),
            FlagValue::Switch(false) => OsString::from("OFF"),
            FlagValue::Bool(true) => OsString::from("TRUE"),
            FlagValue::Bool(false) => OsString::from("FALSE"),
        }
    }
}

/// A single CMake cache definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CMakeFlag {
    pub key: String,
    pub value: FlagValue,
}

impl CMakeFlag {
    pub fn new(key: impl Into<String>, value: FlagValue) -> Self {
        CMakeFlag {
            key: key.into(),
            value,
        }
    }

    pub fn str(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, FlagValue::Str(value.into()))
    }

    pub fn switch(key: impl Into<String>, on: bool) -> Self {
        Self::new(key, FlagValue::Switch(on))
    }

    /// Parse a user-supplied `-DKEY=VALUE` or `-DKEY:TYPE=VALUE` argument.
    ///
    /// Keys owned by the build policy are rejected.
    pub fn parse(arg: &str) -> Result<Self> {
        let Some(rest) = arg.strip_prefix("-D") else {
            bail!("CMake argument `{}` must have the form -DKEY=VALUE", arg);
        };

        let Some((key, value)) = rest.split_once('=') else {
            bail!("CMake argument `{}` is missing `=VALUE`", arg);
        };

        let bare_key = key.split(':').next().unwrap_or(key);
        if bare_key.is_empty() {
            bail!("CMake argument `{}` has an empty key", arg);
        }
        if POLICY_KEYS.contains(&bare_key) {
            bail!(
                "CMake argument `{}` overrides `{}`, which berth always sets itself",
                arg,
                bare_key
            );
        }

        Ok(CMakeFlag::str(key, value))
    }

    /// Render as a command-line argument.
    pub fn to_arg(&self) -> OsString {
        let mut arg = OsString::from(format!("-D{}=", self.key));
        arg.push(self.value.to_os_string());
        arg
    }
}

/// Where the packaging tool expects built extensions to land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    build_lib: PathBuf,
    ext_suffix: String,
}

impl OutputLayout {
    pub fn new(build_lib: impl Into<PathBuf>, ext_suffix: impl Into<String>) -> Self {
        OutputLayout {
            build_lib: build_lib.into(),
            ext_suffix: ext_suffix.into(),
        }
    }

    /// Root of the importable tree.
    pub fn build_lib(&self) -> &Path {
        &self.build_lib
    }

    /// Filename suffix of extension modules, including the leading dot.
    pub fn ext_suffix(&self) -> &str {
        &self.ext_suffix
    }

    /// Full path of the artifact for a dotted module name.
    ///
    /// `pkg._ext` becomes `<build_lib>/pkg/_ext<suffix>`.
    pub fn artifact_path(&self, module: &str) -> PathBuf {
        let mut path = self.build_lib.clone();
        let mut segments = module.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{}{}", segment, self.ext_suffix));
            }
        }
        path
    }

    /// Directory the artifact for `module` is written to.
    pub fn artifact_dir(&self, module: &str) -> PathBuf {
        let path = self.artifact_path(module);
        path.parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.build_lib.clone())
    }
}

/// Default extension module suffix for the host platform.
pub fn default_ext_suffix() -> &'static str {
    if cfg!(windows) {
        ".pyd"
    } else {
        ".so"
    }
}

/// Everything a build session needs besides the target list.
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    pub build_type: BuildType,
    pub layout: OutputLayout,
    /// Scratch directory CMake configures and builds in.
    pub staging_dir: PathBuf,
    /// Interpreter the extensions are built for.
    pub interpreter: PathBuf,
    /// Version of the outer package, forwarded to the native build.
    pub version_info: String,
    pub position_independent_code: bool,
    pub install_rpath: String,
    /// User flags appended after the policy flags, in order.
    pub extra_flags: Vec<CMakeFlag>,
    /// Forwarded to `cmake --build --parallel`.
    pub jobs: Option<usize>,
    /// Require each artifact to exist after its build step.
    pub verify_artifacts: bool,
}

impl BuildConfiguration {
    pub fn new(
        layout: OutputLayout,
        staging_dir: impl Into<PathBuf>,
        interpreter: impl Into<PathBuf>,
        version_info: impl Into<String>,
    ) -> Self {
        BuildConfiguration {
            build_type: BuildType::default(),
            layout,
            staging_dir: staging_dir.into(),
            interpreter: interpreter.into(),
            version_info: version_info.into(),
            position_independent_code: true,
            install_rpath: DEFAULT_INSTALL_RPATH.to_string(),
            extra_flags: Vec::new(),
            jobs: None,
            verify_artifacts: true,
        }
    }

    pub fn with_build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = build_type;
        self
    }

    pub fn with_extra_flags(mut self, flags: impl IntoIterator<Item = CMakeFlag>) -> Self {
        self.extra_flags.extend(flags);
        self
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn verify_artifacts(mut self, verify: bool) -> Self {
        self.verify_artifacts = verify;
        self
    }

    /// Configure flags for an extension whose artifact goes to `artifact_dir`.
    pub fn configure_flags(&self, artifact_dir: &Path) -> Vec<CMakeFlag> {
        let mut flags = vec![
            CMakeFlag::new(
                "CMAKE_LIBRARY_OUTPUT_DIRECTORY",
                FlagValue::Directory(artifact_dir.to_path_buf()),
            ),
            CMakeFlag::new("PYTHON_EXECUTABLE", FlagValue::Path(self.interpreter.clone())),
            CMakeFlag::str("EXAMPLE_VERSION_INFO", self.version_info.clone()),
            CMakeFlag::str("CMAKE_BUILD_TYPE", self.build_type.as_str()),
            CMakeFlag::switch("USE_PYTHON_EXTENSION", false),
            CMakeFlag::switch("BUILD_EXAMPLES", false),
            CMakeFlag::switch("BUILD_TESTS", false),
            CMakeFlag::switch("BUILD_SHARED_LIBS", false),
            CMakeFlag::new("CMAKE_BUILD_WITH_INSTALL_RPATH", FlagValue::Bool(true)),
            CMakeFlag::str("CMAKE_INSTALL_RPATH", self.install_rpath.clone()),
            CMakeFlag::switch(
                "CMAKE_POSITION_INDEPENDENT_CODE",
                self.position_independent_code,
            ),
        ];
        flags.extend(self.extra_flags.iter().cloned());
        flags
    }
}
