//! Filesystem utilities.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{is_separator, Component, Path, PathBuf, MAIN_SEPARATOR_STR};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Make a path absolute against `base` without touching the filesystem.
///
/// An empty path resolves to `base` itself. The result is normalized with
/// [`normalize_path`].
pub fn absolute_from(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Remove `.` and `..` components lexically, without resolving symlinks.
///
/// `..` at the root stays at the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(Component::ParentDir.as_os_str()),
            },
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Render a directory path with exactly one trailing separator.
///
/// CMake treats `CMAKE_LIBRARY_OUTPUT_DIRECTORY` without a trailing separator
/// as a possible file prefix, so directory arguments always end in one.
/// Non-UTF-8 paths are passed through unchanged.
pub fn dir_arg(path: &Path) -> OsString {
    // Collecting components drops any trailing separators.
    let mut s = path.components().collect::<PathBuf>().into_os_string();
    let ends_with_separator = s
        .as_encoded_bytes()
        .last()
        .is_some_and(|b| is_separator(char::from(*b)));
    if !ends_with_separator {
        s.push(MAIN_SEPARATOR_STR);
    }
    s
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}
