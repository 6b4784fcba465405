//! User-friendly diagnostic messages.
//!
//! Every error shown to the user carries its root cause, the valid
//! alternatives where there are any, and a suggested fix.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no recipe file is found.
    pub const NO_RECIPE: &str = "help: Run `quay new <name>` to create a recipe";

    /// Suggestion when the requested settings are not supported.
    pub const CHANGE_SETTINGS: &str =
        "Pick a supported value with `--os`/`--arch`, or adjust options with `-o name=value`";

    /// Suggestion when the recipe file itself is malformed.
    pub const CHECK_RECIPE: &str = "Check Recipe.toml against `quay validate --verbose`";

    /// Suggestion when an option is unknown or has a bad value.
    pub const LIST_OPTIONS: &str = "Run `quay validate` to see the declared options";

    /// Suggestion when a dependency package is not installed.
    pub const CREATE_DEPENDENCY: &str =
        "Create the dependency first with `quay create` in its recipe directory";

    /// Suggestion when the external build fails.
    pub const BUILD_FAILED: &str = "Run `quay create --verbose` for more details";
}

/// An error message with optional context and suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
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
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
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

        let label = if color { "\x1b[1;31merror\x1b[0m" } else { "error" };
        output.push_str(&format!("{}: {}\n", label, self.message));

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
        let diag = Diagnostic::error(
            "regxmllib 1.1.5 does not support configuration `os=Windows, shared=true`",
        )
        .with_context("does not support building shared library on Windows")
            .with_suggestion("Build a static library with `-o shared=false`")
            .with_location("Recipe.toml");

        let output = diag.format(false);
        assert!(output.starts_with("error: regxmllib 1.1.5 does not support"));
        assert!(output.contains("  --> Recipe.toml"));
        assert!(output.contains("  = does not support building shared library"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("1. Build a static library"));
    }

    #[test]
    fn test_error_without_suggestions() {
        let output = Diagnostic::error("descriptor exists").format(false);
        assert_eq!(output, "error: descriptor exists\n");

        let colored = Diagnostic::error("descriptor exists").format(true);
        assert!(colored.starts_with("\x1b[1;31merror\x1b[0m: descriptor exists"));
    }
}
