//! Resolution against the local package store.

use std::path::{Path, PathBuf};

use semver::Version;

use crate::core::dependency::DependencyRequirement;
use crate::core::errors::RecipeError;
use crate::core::options::OptionSet;
use crate::core::package::{InstalledPackage, PACKAGE_INFO_FILE};
use crate::core::settings::PlatformSpec;
use crate::resolver::{DependencyResolver, ResolvedDependency};
use crate::util::fs::subdirs;

/// Resolver backed by `<packages_dir>/<name>/<version>/<package_id>/`.
#[derive(Debug, Clone)]
pub struct InstalledPackages {
    root: PathBuf,
}

impl InstalledPackages {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        InstalledPackages { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Installed versions of `name`, newest first. Non-semver directories are skipped.
    pub fn versions(&self, name: &str) -> Vec<(Version, PathBuf)> {
        let dirs = match subdirs(&self.root.join(name)) {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::debug!("cannot list versions of {}: {:#}", name, e);
                return Vec::new();
            }
        };

        let mut versions: Vec<_> = dirs
            .into_iter()
            .filter_map(|dir| {
                let raw = dir.file_name()?.to_str()?.to_string();
                match Version::parse(&raw) {
                    Ok(v) => Some((v, dir)),
                    Err(_) => {
                        tracing::debug!("skipping non-semver version directory {}", dir.display());
                        None
                    }
                }
            })
            .collect();
        versions.sort_by(|a, b| b.0.cmp(&a.0));
        versions
    }

    /// Binary packages installed under one version directory.
    fn binaries(&self, version_dir: &Path) -> Vec<InstalledPackage> {
        subdirs(version_dir)
            .unwrap_or_default()
            .into_iter()
            .filter(|dir| dir.join(PACKAGE_INFO_FILE).is_file())
            .filter_map(|dir| match InstalledPackage::load(&dir) {
                Ok(pkg) => Some(pkg),
                Err(e) => {
                    tracing::warn!("ignoring broken package at {}: {:#}", dir.display(), e);
                    None
                }
            })
            .collect()
    }

    fn resolve_one(
        &self,
        req: &DependencyRequirement,
        platform: &PlatformSpec,
    ) -> Result<InstalledPackage, RecipeError> {
        let missing = |reason: String| RecipeError::MissingDependency {
            name: req.name.clone(),
            requirement: req.version_req.to_string(),
            reason,
        };

        let versions = self.versions(&req.name);
        if versions.is_empty() {
            return Err(missing(format!(
                "`{}` is not installed in {}",
                req.name,
                self.root.display()
            )));
        }

        let overrides = req.options_override();
        let mut matched_version = false;
        for (version, dir) in &versions {
            if !req.version_req.matches(version) {
                continue;
            }
            matched_version = true;
            if let Some(pkg) = self
                .binaries(dir)
                .into_iter()
                .find(|pkg| binary_matches(pkg, platform, &overrides))
            {
                tracing::debug!("resolved {} to {} ({})", req.name, pkg.version, pkg.package_id);
                return Ok(pkg);
            }
        }

        let found: Vec<_> = versions.iter().map(|(v, _)| v.to_string()).collect();
        if matched_version {
            Err(missing(format!(
                "no binary of `{}` built for {} {} with {}",
                req.name, platform.os, platform.arch, overrides
            )))
        } else {
            Err(missing(format!("installed versions: {}", found.join(", "))))
        }
    }
}

/// Whether an installed binary fits the platform and forced options.
///
/// Forced options the package does not declare are ignored.
fn binary_matches(pkg: &InstalledPackage, platform: &PlatformSpec, overrides: &OptionSet) -> bool {
    pkg.settings.os == platform.os
        && pkg.settings.arch == platform.arch
        && overrides
            .iter()
            .all(|(name, value)| pkg.options.get(name).map_or(true, |v| v == value))
}

impl DependencyResolver for InstalledPackages {
    fn resolve(
        &self,
        requirements: &[DependencyRequirement],
        platform: &PlatformSpec,
    ) -> Result<Vec<ResolvedDependency>, RecipeError> {
        requirements
            .iter()
            .map(|req| {
                Ok(ResolvedDependency {
                    requirement: req.clone(),
                    package: self.resolve_one(req, platform)?,
                })
            })
            .collect()
    }
}
