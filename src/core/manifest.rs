//! Berth.toml manifest parsing and schema.
//!
//! The manifest declares the package metadata forwarded to CMake and the
//! list of native extensions to build, in build order.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::builder::config::{BuildType, CMakeFlag, DEFAULT_INSTALL_RPATH};
use crate::core::target::BuildTarget;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "Berth.toml";

/// Raw manifest as deserialized from TOML.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    package: Package,

    #[serde(default)]
    build: BuildSettings,

    #[serde(default, rename = "extension")]
    extensions: Vec<RawExtension>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawExtension {
    name: String,

    #[serde(default)]
    source_dir: Option<PathBuf>,
}

/// The `[package]` table.
///
/// Other descriptive keys (description, license, ...) are accepted and
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
}

/// The `[build]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct BuildSettings {
    /// Build type used when `BUILD_TYPE` is not set.
    pub build_type: Option<String>,

    /// Extra `-DKEY=VALUE` arguments appended to every configure step.
    pub cmake_args: Vec<String>,

    /// Runtime search path embedded in the artifacts.
    pub install_rpath: String,

    pub position_independent_code: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            build_type: None,
            cmake_args: Vec::new(),
            install_rpath: DEFAULT_INSTALL_RPATH.to_string(),
            position_independent_code: true,
        }
    }
}

impl BuildSettings {
    /// The manifest's build type, or `Release`.
    pub fn default_build_type(&self) -> BuildType {
        BuildType::resolve(self.build_type.as_deref(), BuildType::Release)
    }
}

/// A parsed and validated manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    package: Package,
    build: BuildSettings,
    extra_flags: Vec<CMakeFlag>,
    targets: Vec<BuildTarget>,
}

impl Manifest {
    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content. Relative paths resolve against the directory
    /// containing `path`.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .context("failed to determine current directory")?
                .join(path)
        };
        let manifest_dir = path.parent().unwrap_or(Path::new("/")).to_path_buf();

        if raw.package.name.trim().is_empty() {
            bail!("[package] name cannot be empty in {}", path.display());
        }
        if raw.package.version.trim().is_empty() {
            bail!("[package] version cannot be empty in {}", path.display());
        }

        let extra_flags = raw
            .build
            .cmake_args
            .iter()
            .map(|arg| CMakeFlag::parse(arg))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("invalid [build] cmake-args in {}", path.display()))?;

        let mut targets = Vec::with_capacity(raw.extensions.len());
        for ext in raw.extensions {
            let source_dir = ext.source_dir.unwrap_or_default();
            let target = BuildTarget::with_base(&ext.name, &source_dir, &manifest_dir)
                .with_context(|| format!("invalid [[extension]] in {}", path.display()))?;

            if targets.iter().any(|t: &BuildTarget| t.name() == target.name()) {
                bail!(
                    "extension `{}` is declared more than once in {}",
                    target.name(),
                    path.display()
                );
            }
            targets.push(target);
        }

        Ok(Manifest {
            path,
            package: raw.package,
            build: raw.build,
            extra_flags,
            targets,
        })
    }

    /// Absolute path of the manifest file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the manifest.
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("/"))
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn build_settings(&self) -> &BuildSettings {
        &self.build
    }

    /// Parsed `[build] cmake-args`.
    pub fn extra_flags(&self) -> &[CMakeFlag] {
        &self.extra_flags
    }

    /// Declared extensions, in build order.
    pub fn targets(&self) -> &[BuildTarget] {
        &self.targets
    }
}

/// Find `Berth.toml` in `start` or any of its ancestors.
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}
