//! Dependency resolution.
//!
//! Recipes only declare what they need. Turning a [`DependencyRequirement`]
//! into a concrete package is the job of a [`DependencyResolver`]; the
//! default one looks in the local package store.

pub mod installed;

pub use installed::InstalledPackages;

use std::path::Path;

use crate::core::dependency::DependencyRequirement;
use crate::core::errors::RecipeError;
use crate::core::package::InstalledPackage;
use crate::core::settings::PlatformSpec;

/// A requirement paired with the package chosen for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub requirement: DependencyRequirement,
    pub package: InstalledPackage,
}

impl ResolvedDependency {
    pub fn prefix(&self) -> &Path {
        &self.package.prefix
    }
}

/// Resolves declared requirements to installed packages.
pub trait DependencyResolver {
    /// Resolve every requirement, in order.
    ///
    /// Fails with [`RecipeError::MissingDependency`] on the first requirement
    /// nothing satisfies.
    fn resolve(
        &self,
        requirements: &[DependencyRequirement],
        platform: &PlatformSpec,
    ) -> Result<Vec<ResolvedDependency>, RecipeError>;
}
