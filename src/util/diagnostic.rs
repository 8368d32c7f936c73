//! User-friendly diagnostic messages.
//!
//! Every fatal error names the root cause and, where one exists, a concrete
//! next step for the user.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no manifest file is found.
    pub const NO_MANIFEST: &str = "Create a Berth.toml declaring [package] and [[extension]] entries";

    /// Suggestion when CMake cannot be found.
    pub const INSTALL_CMAKE: &str = "Install CMake >= 3.10 and ensure it's in your PATH, or pass --cmake <path>";

    /// Suggestion when CMake is too old.
    pub const UPGRADE_CMAKE: &str = "Upgrade CMake (e.g. `pip install cmake` or your system package manager)";

    /// Suggestion when a target fails to configure or build.
    pub const BUILD_FAILED: &str = "Run `berth build-ext --verbose` to see the exact CMake commands";

    /// Suggestion when no interpreter could be located.
    pub const NO_INTERPRETER: &str = "Pass --interpreter <path> or set the PYTHON environment variable";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (color, self.severity) {
            (true, Severity::Error) => "\x1b[1;31merror\x1b[0m",
            (true, Severity::Warning) => "\x1b[1;33mwarning\x1b[0m",
            (false, Severity::Error) => "error",
            (false, Severity::Warning) => "warning",
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("failed to build extension `_frankx`")
            .with_context("stage: build")
            .with_context("exit code: 2")
            .with_suggestion(suggestions::BUILD_FAILED);

        let output = diag.format(false);
        assert!(output.contains("error: failed to build extension `_frankx`"));
        assert!(output.contains("exit code: 2"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Run `berth build-ext --verbose`"));
    }

    #[test]
    fn test_warning_with_location() {
        let diag = Diagnostic::warning("unknown build type `Profile`").with_location("Berth.toml");

        let output = diag.format(false);
        assert!(output.starts_with("warning: unknown build type"));
        assert!(output.contains("--> Berth.toml"));
        assert!(!output.contains("help"));
    }
}
