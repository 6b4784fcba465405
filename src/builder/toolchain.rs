//! The external toolchain seam.
//!
//! Generating, building and installing are delegated to a [`Toolchain`].
//! The pipeline only sees the three steps and their outputs, so tests can
//! substitute a recording mock for the real CMake driver.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::dependency::ToolRequirement;
use crate::core::errors::RecipeError;
use crate::core::identity::ComponentIdentity;
use crate::core::options::{OptionSet, OptionValue};
use crate::core::settings::{BuildType, PlatformSpec};
use crate::resolver::ResolvedDependency;
use crate::util::process::{find_executable, tool_version};

/// Directories a build works in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub install_prefix: PathBuf,
}

/// Everything the generate step needs to know.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub identity: &'a ComponentIdentity,
    pub platform: &'a PlatformSpec,
    pub options: &'a OptionSet,
    pub dependencies: &'a [ResolvedDependency],
    /// Extra cache variables from the recipe.
    pub variables: &'a BTreeMap<String, OptionValue>,
    pub layout: &'a BuildLayout,
}

/// Output of the generate step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainFiles {
    pub toolchain_file: PathBuf,
    pub layout: BuildLayout,
    pub build_type: BuildType,
}

/// Output of the build step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifacts {
    pub layout: BuildLayout,
    pub build_type: BuildType,
}

/// Output of the install step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledLayout {
    pub prefix: PathBuf,
}

/// An external build system driver.
pub trait Toolchain {
    /// Verify that the recipe's build tools are available.
    ///
    /// Runs before anything is written, so a missing tool is reported as a
    /// configuration error.
    fn check_tools(&self, tools: &[ToolRequirement]) -> Result<(), RecipeError> {
        let _ = tools;
        Ok(())
    }

    /// Write the toolchain and dependency files for a build.
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<ToolchainFiles>;

    /// Configure and compile.
    fn build(&self, files: &ToolchainFiles) -> Result<BuildArtifacts>;

    /// Install the built artifacts into the layout's prefix.
    fn install(&self, artifacts: &BuildArtifacts) -> Result<InstalledLayout>;
}

/// Check each tool is on `PATH` and, when it reports one, that its version fits.
pub fn check_host_tools(tools: &[ToolRequirement]) -> Result<(), RecipeError> {
    for tool in tools {
        let missing = || RecipeError::MissingTool {
            name: tool.name.clone(),
            requirement: tool.version_req.to_string(),
        };

        let path = find_executable(&tool.name).ok_or_else(missing)?;
        match tool_version(&path) {
            Some(version) if !tool.version_req.matches(&version) => {
                tracing::debug!("{} {} does not satisfy {}", tool.name, version, tool.version_req);
                return Err(missing());
            }
            Some(version) => {
                tracing::debug!("found {} {} at {}", tool.name, version, path.display())
            }
            None => tracing::debug!(
                "found {} at {} but could not determine its version",
                tool.name,
                path.display()
            ),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_reported() {
        let tools = vec![ToolRequirement {
            name: "quay-definitely-not-a-tool".to_string(),
            version_req: ">=1.0".parse().unwrap(),
        }];
        let err = check_host_tools(&tools).unwrap_err();
        assert!(matches!(
            err,
            RecipeError::MissingTool { ref name, .. } if name == "quay-definitely-not-a-tool"
        ));
    }

    #[test]
    fn test_no_tools_is_ok() {
        assert!(check_host_tools(&[]).is_ok());
    }
}
