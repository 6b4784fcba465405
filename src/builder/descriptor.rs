//! Build descriptor synthesis.
//!
//! When the source tree has no `CMakeLists.txt`, one is generated from the
//! component identity and the recipe's `[descriptor]` layout. Generation is
//! split in two: [`BuildDescriptor`] is plain data, and [`render_cmake`]
//! turns it into text. The same descriptor always renders to the same bytes.

use std::io;
use std::path::{Path, PathBuf};

use crate::core::dependency::FindSpec;
use crate::core::errors::RecipeError;
use crate::core::identity::ComponentIdentity;
use crate::core::recipe::{Language, Recipe};
use crate::util::fs::{glob_files, write_new};

/// Install destination for libraries.
pub const LIB_DESTINATION: &str = "lib";
/// Install destination for executables and DLLs.
pub const BIN_DESTINATION: &str = "bin";
/// Install destination for public headers.
pub const INCLUDE_DESTINATION: &str = "include";

/// Everything needed to render a build descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDescriptor {
    pub cmake_minimum: String,
    pub project: String,
    /// Numeric project version, if the component version has one.
    pub version: Option<String>,
    pub full_version: String,
    pub language: Language,
    pub target: String,
    pub find_packages: Vec<FindSpec>,
    /// Source root, relative to the descriptor, with forward slashes.
    pub source_dir: String,
    pub source_extensions: Vec<String>,
    pub header_extension: String,
}

impl BuildDescriptor {
    /// Derive the descriptor for a recipe and its resolved identity.
    pub fn from_recipe(recipe: &Recipe, identity: &ComponentIdentity) -> Self {
        let layout = &recipe.descriptor;
        let target = recipe
            .package_info
            .libs
            .first()
            .cloned()
            .unwrap_or_else(|| identity.name.clone());

        BuildDescriptor {
            cmake_minimum: layout.cmake_minimum.clone(),
            project: identity.name.clone(),
            version: cmake_version(&identity.version),
            full_version: identity.version.clone(),
            language: layout.language,
            target,
            find_packages: recipe.requires.iter().map(|r| r.find_spec()).collect(),
            source_dir: to_cmake_path(&layout.sources),
            source_extensions: layout.extensions.clone(),
            header_extension: layout.header_extension.clone(),
        }
    }

    /// Variable holding the globbed source list.
    fn sources_var(&self) -> String {
        let sanitized: String = self
            .target
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}_SOURCES", sanitized)
    }
}

/// Render a descriptor as a `CMakeLists.txt`.
pub fn render_cmake(desc: &BuildDescriptor) -> String {
    let mut out = String::new();
    let src = &desc.source_dir;
    let sources_var = desc.sources_var();

    out.push_str(&format!(
        "# Generated by quay for {} {}. Do not edit.\n",
        desc.project, desc.full_version
    ));
    out.push_str(&format!(
        "cmake_minimum_required(VERSION {})\n",
        desc.cmake_minimum
    ));
    match &desc.version {
        Some(version) => out.push_str(&format!(
            "project({} VERSION {} LANGUAGES {})\n",
            desc.project, version, desc.language
        )),
        None => out.push_str(&format!(
            "project({} LANGUAGES {})\n",
            desc.project, desc.language
        )),
    }

    if !desc.find_packages.is_empty() {
        out.push('\n');
        for find in &desc.find_packages {
            out.push_str(&format!("find_package({} REQUIRED)\n", find.package));
        }
    }

    out.push('\n');
    out.push_str(&format!("file(GLOB_RECURSE {} CONFIGURE_DEPENDS\n", sources_var));
    for ext in &desc.source_extensions {
        out.push_str(&format!(
            "    \"${{CMAKE_CURRENT_SOURCE_DIR}}/{}/*.{}\"\n",
            src, ext
        ));
    }
    out.push_str(")\n");

    out.push('\n');
    out.push_str(&format!("add_library({} ${{{}}})\n", desc.target, sources_var));
    out.push_str(&format!(
        "target_include_directories({} PUBLIC\n    \
         $<BUILD_INTERFACE:${{CMAKE_CURRENT_SOURCE_DIR}}/{}>\n    \
         $<INSTALL_INTERFACE:{}>\n)\n",
        desc.target, src, INCLUDE_DESTINATION
    ));
    if !desc.find_packages.is_empty() {
        let targets: Vec<_> = desc.find_packages.iter().map(|f| f.target.as_str()).collect();
        out.push_str(&format!(
            "target_link_libraries({} PUBLIC {})\n",
            desc.target,
            targets.join(" ")
        ));
    }

    out.push('\n');
    out.push_str(&format!(
        "install(TARGETS {}\n    \
         ARCHIVE DESTINATION {lib}\n    \
         LIBRARY DESTINATION {lib}\n    \
         RUNTIME DESTINATION {bin}\n)\n",
        desc.target,
        lib = LIB_DESTINATION,
        bin = BIN_DESTINATION
    ));
    out.push_str(&format!(
        "install(DIRECTORY {}/\n    DESTINATION {}\n    FILES_MATCHING PATTERN \"*.{}\"\n)\n",
        src, INCLUDE_DESTINATION, desc.header_extension
    ));

    out
}

/// The leading numeric `major[.minor[.patch[.tweak]]]` of a version.
///
/// CMake's `project(VERSION)` rejects anything else.
pub fn cmake_version(version: &str) -> Option<String> {
    let parts: Vec<&str> = version
        .split(|c| c == '-' || c == '+')
        .next()
        .unwrap_or("")
        .split('.')
        .take(4)
        .take_while(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

fn to_cmake_path(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    s.trim_end_matches('/').to_string()
}

/// Result of attempting to synthesize a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// A new descriptor was written.
    Written(PathBuf),
    /// A descriptor already existed and was left untouched.
    Skipped(PathBuf),
}

impl SynthesisOutcome {
    pub fn path(&self) -> &Path {
        match self {
            SynthesisOutcome::Written(p) | SynthesisOutcome::Skipped(p) => p,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, SynthesisOutcome::Written(_))
    }
}

/// Write the recipe's build descriptor unless one is already present.
pub fn synthesize(
    recipe: &Recipe,
    identity: &ComponentIdentity,
) -> Result<SynthesisOutcome, RecipeError> {
    let path = recipe.root.join(&recipe.descriptor.file);
    if path.exists() {
        tracing::info!("Using existing build descriptor {}", path.display());
        return Ok(SynthesisOutcome::Skipped(path));
    }

    let descriptor = BuildDescriptor::from_recipe(recipe, identity);
    warn_if_no_sources(recipe);

    match write_descriptor(&path, &render_cmake(&descriptor)) {
        Ok(()) => {
            tracing::info!("Synthesized build descriptor {}", path.display());
            Ok(SynthesisOutcome::Written(path))
        }
        Err(RecipeError::DescriptorWriteConflict { path }) => {
            tracing::warn!("{} appeared during synthesis, leaving it untouched", path.display());
            Ok(SynthesisOutcome::Skipped(path))
        }
        Err(e) => Err(e),
    }
}

/// Create the descriptor file; never replaces an existing one.
fn write_descriptor(path: &Path, content: &str) -> Result<(), RecipeError> {
    write_new(path, content).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => RecipeError::DescriptorWriteConflict {
            path: path.to_path_buf(),
        },
        _ => RecipeError::DescriptorWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })
}

/// Glob patterns naming the recipe's sources, relative to its root.
///
/// `[build] exports_sources` wins when set; otherwise every file under the
/// descriptor's source directory with one of its extensions.
pub fn source_patterns(recipe: &Recipe) -> Vec<String> {
    if !recipe.build.exports_sources.is_empty() {
        return recipe.build.exports_sources.clone();
    }
    let source_dir = to_cmake_path(&recipe.descriptor.sources);
    recipe
        .descriptor
        .extensions
        .iter()
        .map(|ext| format!("{}/**/*.{}", source_dir, ext))
        .collect()
}

/// The recipe's source files as they are on disk now, sorted.
pub fn source_files(recipe: &Recipe) -> anyhow::Result<Vec<PathBuf>> {
    glob_files(&recipe.root, &source_patterns(recipe))
}

fn warn_if_no_sources(recipe: &Recipe) {
    match source_files(recipe) {
        Ok(files) if files.is_empty() => tracing::warn!(
            "no sources matching {} under {}",
            source_patterns(recipe).join(", "),
            recipe.root.display()
        ),
        Ok(files) => tracing::debug!("{} source files match", files.len()),
        Err(e) => tracing::debug!("could not scan sources: {:#}", e),
    }
}
