//! Target definitions - what gets built.
//!
//! A [`BuildTarget`] names one CMake target and the directory holding the
//! `CMakeLists.txt` that defines it. Each target produces exactly one
//! installable extension module.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::util::fs::absolute_from;

/// A native extension to configure and build with CMake.
///
/// The source directory is always absolute so configure steps run from the
/// staging directory resolve it regardless of the caller's working directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildTarget {
    name: String,
    source_dir: PathBuf,
}

impl BuildTarget {
    /// Create a target, resolving a relative `source_dir` against the
    /// current working directory.
    pub fn new(name: impl Into<String>, source_dir: impl AsRef<Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to determine current directory")?;
        Self::with_base(name, source_dir, &cwd)
    }

    /// Create a target, resolving a relative `source_dir` against `base`.
    ///
    /// `base` itself must be absolute.
    pub fn with_base(
        name: impl Into<String>,
        source_dir: impl AsRef<Path>,
        base: &Path,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;

        if !base.is_absolute() {
            bail!("base directory `{}` is not absolute", base.display());
        }

        Ok(BuildTarget {
            source_dir: absolute_from(source_dir.as_ref(), base),
            name,
        })
    }

    /// The CMake target name, also the module name of the artifact.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute, normalized path of the directory holding `CMakeLists.txt`.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("extension name cannot be empty");
    }

    for segment in name.split('.') {
        if segment.is_empty() {
            bail!("extension name `{}` has an empty module segment", name);
        }
        if segment.contains(['/', '\\']) || segment.chars().any(char::is_whitespace) {
            bail!(
                "extension name `{}` must be a dotted module path, found `{}`",
                name,
                segment
            );
        }
    }

    Ok(())
}

/// Check if a directory contains a CMake project.
pub fn is_cmake_project(dir: &Path) -> bool {
    dir.join("CMakeLists.txt").exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_source_dir_is_made_absolute() {
        let tmp = TempDir::new().unwrap();
        let target = BuildTarget::with_base("_frankx", "native", tmp.path()).unwrap();

        assert!(target.source_dir().is_absolute());
        assert_eq!(target.source_dir(), tmp.path().join("native"));
    }

    #[test]
    fn test_empty_source_dir_is_base() {
        let tmp = TempDir::new().unwrap();
        let target = BuildTarget::with_base("pyaffx", "", tmp.path()).unwrap();
        assert_eq!(target.source_dir(), tmp.path());
    }

    #[test]
    fn test_absolute_source_dir_is_kept() {
        let tmp = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let target = BuildTarget::with_base("_movex", elsewhere.path(), tmp.path()).unwrap();
        assert_eq!(target.source_dir(), elsewhere.path());
    }

    #[test]
    fn test_new_uses_current_dir() {
        let target = BuildTarget::new("alpha", "alpha").unwrap();
        assert!(target.source_dir().is_absolute());
        assert!(target.source_dir().ends_with("alpha"));
    }

    #[test]
    fn test_relative_base_is_rejected() {
        assert!(BuildTarget::with_base("alpha", "src", Path::new("relative")).is_err());
    }

    #[test]
    fn test_name_validation() {
        let base = std::env::temp_dir();
        assert!(BuildTarget::with_base("", ".", &base).is_err());
        assert!(BuildTarget::with_base("pkg.", ".", &base).is_err());
        assert!(BuildTarget::with_base(".pkg", ".", &base).is_err());
        assert!(BuildTarget::with_base("pkg..ext", ".", &base).is_err());
        assert!(BuildTarget::with_base("a/b", ".", &base).is_err());
        assert!(BuildTarget::with_base("has space", ".", &base).is_err());
        assert!(BuildTarget::with_base("pkg._ext", ".", &base).is_ok());
    }

    #[test]
    fn test_source_dir_is_normalized() {
        let tmp = TempDir::new().unwrap();

        let dot = BuildTarget::with_base("_frankx", ".", tmp.path()).unwrap();
        assert_eq!(dot.source_dir(), tmp.path());

        let parent = BuildTarget::with_base("pyaffx", "x/../affx/.", tmp.path()).unwrap();
        assert_eq!(parent.source_dir(), tmp.path().join("affx"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_source_dir_is_kept() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let base = Path::new(OsStr::from_bytes(b"/tmp/caf\xe9"));
        let target = BuildTarget::with_base("alpha", ".", base).unwrap();
        assert_eq!(target.source_dir().as_os_str().as_bytes(), b"/tmp/caf\xe9");
    }

    #[test]
    fn test_is_cmake_project() {
        let tmp = TempDir::new().unwrap();

        assert!(!is_cmake_project(tmp.path()));

        std::fs::write(
            tmp.path().join("CMakeLists.txt"),
            "cmake_minimum_required(VERSION 3.10)",
        )
        .unwrap();

        assert!(is_cmake_project(tmp.path()));
    }
}
