//! Component identity: name and version.
//!
//! The version is either written literally in the recipe or extracted from
//! an external manifest (for example a Maven `pom.xml`) by scanning it line
//! by line for the first match of a tag pattern.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::RecipeError;

/// Pattern used when a manifest version source does not name one.
pub const DEFAULT_VERSION_PATTERN: &str = r"<version>\s*([^<\s]+)\s*</version>";

/// Resolved name and version of a component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentIdentity {
    pub name: String,
    pub version: String,
}

impl fmt::Display for ComponentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Something that can produce a version string.
pub trait VersionSource {
    /// Resolve the version. Relative paths are taken from `root`.
    fn resolve_version(&self, root: &Path) -> Result<String, RecipeError>;
}

/// A version written directly in the recipe.
#[derive(Debug, Clone)]
pub struct LiteralVersion(pub String);

impl VersionSource for LiteralVersion {
    fn resolve_version(&self, _root: &Path) -> Result<String, RecipeError> {
        let version = self.0.trim();
        if version.is_empty() {
            return Err(RecipeError::InvalidRecipe(
                "package version must not be empty".to_string(),
            ));
        }
        Ok(version.to_string())
    }
}

/// A version extracted from the first matching line of a manifest file.
#[derive(Debug, Clone)]
pub struct ManifestVersion {
    path: PathBuf,
    pattern: Regex,
}

impl ManifestVersion {
    /// Create a manifest source. The pattern must have a capture group.
    pub fn new(path: impl Into<PathBuf>, pattern: &str) -> Result<Self, RecipeError> {
        let regex = Regex::new(pattern).map_err(|e| {
            RecipeError::InvalidRecipe(format!("invalid version pattern `{}`: {}", pattern, e))
        })?;
        if regex.captures_len() < 2 {
            return Err(RecipeError::InvalidRecipe(format!(
                "version pattern `{}` has no capture group",
                pattern
            )));
        }
        Ok(ManifestVersion {
            path: path.into(),
            pattern: regex,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl VersionSource for ManifestVersion {
    fn resolve_version(&self, root: &Path) -> Result<String, RecipeError> {
        let path = root.join(&self.path);
        let unreadable = |e: io::Error| RecipeError::ManifestUnreadable {
            path: path.clone(),
            message: e.to_string(),
        };

        let file = File::open(&path).map_err(unreadable)?;
        let found = first_capture(BufReader::new(file), &self.pattern).map_err(unreadable)?;

        match found {
            Some(version) => {
                tracing::debug!("extracted version {} from {}", version, path.display());
                Ok(version)
            }
            None => Err(RecipeError::ManifestVersionNotFound {
                path,
                pattern: self.pattern.as_str().to_string(),
            }),
        }
    }
}

/// Return the first non-empty capture of `pattern` over the lines of `reader`.
///
/// Reading stops at the first match; the rest of the input is not consumed.
pub fn first_capture<R: BufRead>(reader: R, pattern: &Regex) -> io::Result<Option<String>> {
    for line in reader.lines() {
        let line = line?;
        let capture = pattern
            .captures(&line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty());
        if let Some(capture) = capture {
            return Ok(Some(capture.to_string()));
        }
    }
    Ok(None)
}

/// How a recipe declares its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionSpec {
    Literal(String),
    Manifest {
        manifest: PathBuf,
        #[serde(default)]
        pattern: Option<String>,
    },
}

impl VersionSpec {
    /// Build the version source this entry describes.
    pub fn source(&self) -> Result<Box<dyn VersionSource>, RecipeError> {
        match self {
            VersionSpec::Literal(v) => Ok(Box::new(LiteralVersion(v.clone()))),
            VersionSpec::Manifest { manifest, pattern } => Ok(Box::new(ManifestVersion::new(
                manifest,
                pattern.as_deref().unwrap_or(DEFAULT_VERSION_PATTERN),
            )?)),
        }
    }
}

/// Resolve a component identity from its name and version source.
pub fn resolve_identity(
    name: &str,
    source: &dyn VersionSource,
    root: &Path,
) -> Result<ComponentIdentity, RecipeError> {
    let version = source.resolve_version(root)?;
    Ok(ComponentIdentity {
        name: name.to_string(),
        version,
    })
}
