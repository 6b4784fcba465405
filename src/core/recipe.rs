//! Recipe.toml parsing and schema.
//!
//! The recipe is the declarative description of a component: its identity,
//! supported settings, options, pruning policy, requirements and the layout
//! used to synthesize a build descriptor.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::dependency::{DependencyRequirement, ToolRequirement};
use crate::core::errors::RecipeError;
use crate::core::identity::VersionSpec;
use crate::core::options::{OptionDecl, OptionSet, OptionValue};
use crate::core::rules::{Condition, ConflictRule, PruneRule};
use crate::core::settings::{Arch, Os, PlatformSpec};

/// Canonical recipe file name.
pub const RECIPE_FILE: &str = "Recipe.toml";

/// Package metadata from the `[package]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub name: String,
    pub version: VersionSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Supported settings and disallowed combinations.
///
/// `valid_os` and `valid_arch` are independent sets: every os in the first
/// is assumed to work with every arch in the second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityMatrix {
    pub valid_os: Vec<Os>,
    pub valid_arch: Vec<Arch>,
    pub conflicts: Vec<ConflictRule>,
}

impl CompatibilityMatrix {
    pub fn allows_os(&self, os: Os) -> bool {
        self.valid_os.contains(&os)
    }

    pub fn allows_arch(&self, arch: Arch) -> bool {
        self.valid_arch.contains(&arch)
    }

    /// First conflict rule matching the platform and options, if any.
    pub fn conflict_for(
        &self,
        platform: &PlatformSpec,
        options: &OptionSet,
    ) -> Option<&ConflictRule> {
        self.conflicts
            .iter()
            .find(|rule| rule.when.matches(platform, options))
    }
}

impl Default for CompatibilityMatrix {
    fn default() -> Self {
        CompatibilityMatrix {
            valid_os: Os::ALL.to_vec(),
            valid_arch: Arch::ALL.to_vec(),
            conflicts: Vec::new(),
        }
    }
}

/// Source language of the synthesized build target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    C,
    #[default]
    #[serde(rename = "CXX")]
    Cxx,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::C => write!(f, "C"),
            Language::Cxx => write!(f, "CXX"),
        }
    }
}

/// `[build]` section: how the external toolchain is driven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub generator: String,
    pub variables: BTreeMap<String, OptionValue>,
    /// Globs relative to the recipe root naming the component's sources.
    /// Empty means everything the descriptor layout matches.
    pub exports_sources: Vec<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        BuildSection {
            generator: "Ninja".to_string(),
            variables: BTreeMap::new(),
            exports_sources: Vec::new(),
        }
    }
}

/// `[descriptor]` section: layout used when synthesizing a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorSection {
    pub file: PathBuf,
    pub language: Language,
    pub sources: PathBuf,
    pub extensions: Vec<String>,
    pub header_extension: String,
    pub cmake_minimum: String,
}

impl Default for DescriptorSection {
    fn default() -> Self {
        DescriptorSection {
            file: PathBuf::from("CMakeLists.txt"),
            language: Language::Cxx,
            sources: PathBuf::from("src"),
            extensions: vec!["cpp".to_string(), "h".to_string()],
            header_extension: "h".to_string(),
            cmake_minimum: "3.21".to_string(),
        }
    }
}

/// `[package_info]` section: what dependents link against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfoSection {
    #[serde(default)]
    pub libs: Vec<String>,
    #[serde(default)]
    pub bindirs: Vec<String>,
    #[serde(default = "default_includedirs")]
    pub includedirs: Vec<String>,
    #[serde(default = "default_libdirs")]
    pub libdirs: Vec<String>,
}

fn default_includedirs() -> Vec<String> {
    vec!["include".to_string()]
}

fn default_libdirs() -> Vec<String> {
    vec!["lib".to_string()]
}

impl Default for PackageInfoSection {
    fn default() -> Self {
        PackageInfoSection {
            libs: Vec::new(),
            bindirs: Vec::new(),
            includedirs: default_includedirs(),
            libdirs: default_libdirs(),
        }
    }
}

/// Raw recipe as deserialized from TOML.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecipe {
    package: PackageMetadata,
    #[serde(default)]
    settings: RawSettings,
    #[serde(default)]
    options: BTreeMap<String, OptionDecl>,
    #[serde(default)]
    conflicts: Vec<ConflictRule>,
    #[serde(default)]
    prune: Vec<PruneRule>,
    #[serde(default)]
    requires: Vec<DependencyRequirement>,
    #[serde(default)]
    tool_requires: Vec<ToolRequirement>,
    #[serde(default)]
    build: BuildSection,
    #[serde(default)]
    descriptor: DescriptorSection,
    #[serde(default)]
    package_info: PackageInfoSection,
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    os: Option<Vec<Os>>,
    #[serde(default)]
    arch: Option<Vec<Arch>>,
}

/// A parsed, checked recipe.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub package: PackageMetadata,
    pub matrix: CompatibilityMatrix,
    pub options: BTreeMap<String, OptionDecl>,
    pub prune: Vec<PruneRule>,
    pub requires: Vec<DependencyRequirement>,
    pub tool_requires: Vec<ToolRequirement>,
    pub build: BuildSection,
    pub descriptor: DescriptorSection,
    pub package_info: PackageInfoSection,
    /// Directory containing the recipe; the source tree root.
    pub root: PathBuf,
}

impl Recipe {
    /// Load a recipe from a file path.
    pub fn load(path: &Path) -> Result<Self, RecipeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RecipeError::InvalidRecipe(format!("failed to read {}: {}", path.display(), e))
        })?;
        let root = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::parse(&content, root)
    }

    /// Parse recipe content rooted at `root`.
    pub fn parse(content: &str, root: impl Into<PathBuf>) -> Result<Self, RecipeError> {
        let raw: RawRecipe = toml::from_str(content)
            .map_err(|e| {
                RecipeError::InvalidRecipe(format!("failed to parse {}: {}", RECIPE_FILE, e))
            })?;

        let matrix = CompatibilityMatrix {
            valid_os: raw.settings.os.unwrap_or_else(|| Os::ALL.to_vec()),
            valid_arch: raw.settings.arch.unwrap_or_else(|| Arch::ALL.to_vec()),
            conflicts: raw.conflicts,
        };

        let mut package_info = raw.package_info;
        if package_info.libs.is_empty() {
            package_info.libs.push(raw.package.name.clone());
        }

        let recipe = Recipe {
            package: raw.package,
            matrix,
            options: raw.options,
            prune: raw.prune,
            requires: raw.requires,
            tool_requires: raw.tool_requires,
            build: raw.build,
            descriptor: raw.descriptor,
            package_info,
            root: root.into(),
        };
        recipe.check()?;
        Ok(recipe)
    }

    fn check(&self) -> Result<(), RecipeError> {
        let invalid =
            |msg: String| -> Result<(), RecipeError> { Err(RecipeError::InvalidRecipe(msg)) };

        if self.package.name.trim().is_empty() {
            return invalid("package name must not be empty".to_string());
        }
        if self.matrix.valid_os.is_empty() || self.matrix.valid_arch.is_empty() {
            return invalid("`settings.os` and `settings.arch` must not be empty".to_string());
        }

        for (name, decl) in &self.options {
            if !decl.allows(&decl.default) {
                return invalid(format!(
                    "default `{}` of option `{}` is not one of its values [{}]",
                    decl.default,
                    name,
                    decl.describe_values()
                ));
            }
        }

        for rule in &self.prune {
            if !self.options.contains_key(&rule.remove) {
                return invalid(format!("prune rule removes undeclared option `{}`", rule.remove));
            }
            self.check_condition(&rule.when)?;
        }
        for rule in &self.matrix.conflicts {
            self.check_condition(&rule.when)?;
        }
        for req in &self.requires {
            if req.name == self.package.name {
                return invalid(format!("package `{}` requires itself", req.name));
            }
        }
        for pattern in &self.build.exports_sources {
            if let Err(e) = glob::Pattern::new(pattern) {
                return invalid(format!("invalid `exports_sources` pattern `{}`: {}", pattern, e));
            }
        }
        Ok(())
    }

    fn check_condition(&self, when: &Condition) -> Result<(), RecipeError> {
        for (name, value) in &when.options {
            match self.options.get(name) {
                None => {
                    return Err(RecipeError::InvalidRecipe(format!(
                        "rule condition refers to undeclared option `{}`",
                        name
                    )))
                }
                Some(decl) if !decl.allows(value) => {
                    return Err(RecipeError::InvalidRecipe(format!(
                        "rule condition uses value `{}` not declared for option `{}`",
                        value, name
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.package.name
    }

    /// The option set built from declared defaults.
    pub fn default_options(&self) -> OptionSet {
        self.options
            .iter()
            .map(|(name, decl)| (name.clone(), decl.default.clone()))
            .collect()
    }

    /// Apply `name=value` overrides on top of the defaults.
    ///
    /// Only declared options may be overridden, and only with declared values.
    pub fn requested_options(
        &self,
        overrides: &[(String, String)],
    ) -> Result<OptionSet, RecipeError> {
        let mut options = self.default_options();
        for (name, raw) in overrides {
            let decl = self.options.get(name).ok_or_else(|| RecipeError::UnknownOption {
                option: name.clone(),
                declared: self.options.keys().cloned().collect(),
            })?;
            let value = decl.parse_value(raw).ok_or_else(|| RecipeError::InvalidOption {
                option: name.clone(),
                value: raw.clone(),
                allowed: decl.describe_values(),
            })?;
            options.insert(name.clone(), value);
        }
        Ok(options)
    }
}

/// Generate a starter recipe for `quay new`.
pub fn generate_recipe(name: &str) -> String {
    format!(
        r#"[package]
name = "{name}"
version = "0.1.0"
description = "The {name} library"
license = "MIT"

[settings]
os = ["Windows", "Linux", "Macos"]
arch = ["x86_64", "armv8"]

[options.shared]
values = [true, false]
default = false

[options.fPIC]
values = [true, false]
default = true

[[prune]]
remove = "fPIC"
when = {{ os = "Windows" }}

[[prune]]
remove = "fPIC"
when = {{ options = {{ shared = false }} }}

[[tool_requires]]
name = "cmake"
version = ">=3.21"

[build]
generator = "Ninja"
variables = {{ BUILD_TESTING = false }}

[descriptor]
language = "C"
sources = "src"
extensions = ["c", "h"]

[package_info]
libs = ["{name}"]
"#
    )
}
