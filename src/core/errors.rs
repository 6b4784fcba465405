//! Recipe error types and diagnostics.
//!
//! Every failure that halts the recipe pipeline is a [`RecipeError`]. Each
//! variant can be turned into a user-facing [`Diagnostic`] carrying the
//! valid alternatives and a suggested fix.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// The setting dimension an unsupported-platform error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformDimension {
    Os,
    Arch,
    /// A combination of a setting and an option value.
    OptionCombination,
}

impl fmt::Display for PlatformDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformDimension::Os => write!(f, "operating system"),
            PlatformDimension::Arch => write!(f, "architecture"),
            PlatformDimension::OptionCombination => write!(f, "configuration"),
        }
    }
}

/// External toolchain step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainStep {
    Generate,
    Build,
    Install,
}

impl fmt::Display for ToolchainStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolchainStep::Generate => write!(f, "generate"),
            ToolchainStep::Build => write!(f, "build"),
            ToolchainStep::Install => write!(f, "install"),
        }
    }
}

/// Error raised by a recipe pipeline stage.
#[derive(Debug, Clone, Error, MietteDiagnostic)]
pub enum RecipeError {
    #[error("{package} does not support {dimension} `{value}`")]
    #[diagnostic(code(quay::validate::unsupported_platform))]
    UnsupportedPlatform {
        package: String,
        dimension: PlatformDimension,
        value: String,
        valid: Vec<String>,
        reason: Option<String>,
    },

    #[error("no version matching `{pattern}` found in {}", path.display())]
    #[diagnostic(code(quay::identity::version_not_found))]
    ManifestVersionNotFound { path: PathBuf, pattern: String },

    #[error("failed to read manifest {}: {message}", path.display())]
    #[diagnostic(code(quay::identity::manifest_unreadable))]
    ManifestUnreadable { path: PathBuf, message: String },

    #[error("invalid recipe: {0}")]
    #[diagnostic(code(quay::recipe::invalid))]
    InvalidRecipe(String),

    #[error("unknown option `{option}`")]
    #[diagnostic(code(quay::options::unknown))]
    UnknownOption { option: String, declared: Vec<String> },

    #[error("invalid value `{value}` for option `{option}`")]
    #[diagnostic(code(quay::options::invalid_value))]
    InvalidOption {
        option: String,
        value: String,
        allowed: String,
    },

    #[error("no installed package satisfies `{name} {requirement}`")]
    #[diagnostic(code(quay::requires::missing))]
    MissingDependency {
        name: String,
        requirement: String,
        reason: String,
    },

    #[error("build tool `{name}` ({requirement}) not found")]
    #[diagnostic(code(quay::requires::missing_tool))]
    MissingTool { name: String, requirement: String },

    #[error("toolchain {step} step failed: {message}")]
    #[diagnostic(code(quay::toolchain::failed))]
    Toolchain { step: ToolchainStep, message: String },

    #[error("build descriptor {} already exists", path.display())]
    #[diagnostic(code(quay::descriptor::exists))]
    DescriptorWriteConflict { path: PathBuf },

    #[error("failed to write {}: {message}", path.display())]
    #[diagnostic(code(quay::descriptor::write_failed))]
    DescriptorWrite { path: PathBuf, message: String },

    #[error("cannot {operation} while pipeline is {state}")]
    #[diagnostic(code(quay::pipeline::stage_order))]
    StageOrder {
        operation: &'static str,
        state: String,
    },
}

impl RecipeError {
    /// Whether this error was raised before any external side effect.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            RecipeError::Toolchain { .. }
                | RecipeError::DescriptorWrite { .. }
                | RecipeError::StageOrder { .. }
        )
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            RecipeError::UnsupportedPlatform {
                dimension,
                valid,
                reason,
                ..
            } => {
                let mut diag = diag;
                if let Some(reason) = reason {
                    diag = diag.with_context(reason.clone());
                }
                if !valid.is_empty() {
                    diag = diag.with_context(format!(
                        "supported {} values: {}",
                        dimension,
                        valid.join(", ")
                    ));
                }
                diag.with_suggestion(suggestions::CHANGE_SETTINGS)
            }

            RecipeError::ManifestVersionNotFound { .. } => diag
                .with_context("the version is extracted from the first matching line")
                .with_suggestion("Check the `version.pattern` in Recipe.toml")
                .with_suggestion("Use a literal `version = \"x.y.z\"` instead"),

            RecipeError::ManifestUnreadable { path, .. } => diag.with_location(path),

            RecipeError::InvalidRecipe(_) => diag.with_suggestion(suggestions::CHECK_RECIPE),

            RecipeError::UnknownOption { declared, .. } => diag
                .with_context(if declared.is_empty() {
                    "this recipe declares no options".to_string()
                } else {
                    format!("declared options: {}", declared.join(", "))
                })
                .with_suggestion(suggestions::LIST_OPTIONS),

            RecipeError::InvalidOption { allowed, .. } => diag
                .with_context(format!("allowed values: {}", allowed))
                .with_suggestion(suggestions::LIST_OPTIONS),

            RecipeError::MissingDependency { reason, .. } => diag
                .with_context(reason.clone())
                .with_suggestion(suggestions::CREATE_DEPENDENCY),

            RecipeError::MissingTool { name, .. } => diag
                .with_suggestion(format!("Install `{}` and ensure it is in your PATH", name)),

            RecipeError::Toolchain { .. } => diag.with_suggestion(suggestions::BUILD_FAILED),

            RecipeError::DescriptorWriteConflict { path } => diag
                .with_location(path)
                .with_context("user-provided descriptors are never overwritten"),

            RecipeError::DescriptorWrite { path, .. } => diag.with_location(path),

            RecipeError::StageOrder { .. } => diag,
        }
    }
}
