//! Core data structures for Quay.
//!
//! This module contains the foundational types used throughout Quay:
//! - Platform settings and option sets
//! - Recipes, conditions and prune rules
//! - Component identity and dependency requirements
//! - Installed package records

pub mod dependency;
pub mod errors;
pub mod identity;
pub mod options;
pub mod package;
pub mod recipe;
pub mod rules;
pub mod settings;

pub use dependency::{DependencyRequirement, ToolRequirement};
pub use errors::RecipeError;
pub use identity::ComponentIdentity;
pub use options::{OptionSet, OptionValue};
pub use package::InstalledPackage;
pub use recipe::{Recipe, RECIPE_FILE};
pub use settings::{Arch, BuildType, Compiler, Os, PlatformSpec};
