//! Test utilities and mocks for Quay unit tests.
//!
//! Provides a recording [`MockToolchain`] standing in for CMake and an
//! in-memory [`MockResolver`] standing in for the package store.
//!
//! # Example
//!
//! ```rust,ignore
//! use quay::test_support::{MockResolver, MockToolchain};
//!
//! let toolchain = MockToolchain::failing_at(ToolchainStep::Build, "compile error");
//! let mut pipeline = RecipePipeline::new(&recipe, &toolchain, &MockResolver::new(), settings);
//! assert!(pipeline.run().is_err());
//! assert_eq!(toolchain.calls(), vec!["generate", "build"]);
//! ```

pub mod fixtures;

use std::cell::RefCell;
use std::path::PathBuf;

use anyhow::{bail, Result};
use semver::Version;

use crate::builder::toolchain::{
    BuildArtifacts, GenerateRequest, InstalledLayout, Toolchain, ToolchainFiles,
};
use crate::core::dependency::{DependencyRequirement, ToolRequirement};
use crate::core::errors::{RecipeError, ToolchainStep};
use crate::core::options::OptionSet;
use crate::core::package::InstalledPackage;
use crate::core::settings::PlatformSpec;
use crate::resolver::{DependencyResolver, ResolvedDependency};

pub use fixtures::*;

/// What a [`MockToolchain`] saw in its generate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub platform: PlatformSpec,
    pub options: OptionSet,
    pub dependency_prefixes: Vec<PathBuf>,
}

/// Toolchain that records calls and never spawns a process.
#[derive(Debug, Default)]
pub struct MockToolchain {
    calls: RefCell<Vec<String>>,
    requests: RefCell<Vec<RecordedRequest>>,
    fail_at: Option<(ToolchainStep, String)>,
    missing_tool: Option<String>,
}

impl MockToolchain {
    pub fn new() -> Self {
        MockToolchain::default()
    }

    /// A toolchain whose `step` fails with `message`.
    pub fn failing_at(step: ToolchainStep, message: impl Into<String>) -> Self {
        MockToolchain {
            fail_at: Some((step, message.into())),
            ..Default::default()
        }
    }

    /// A toolchain that reports `name` as absent from the host.
    pub fn missing_tool(name: impl Into<String>) -> Self {
        MockToolchain {
            missing_tool: Some(name.into()),
            ..Default::default()
        }
    }

    /// Names of the steps called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.borrow().last().cloned()
    }

    fn enter(&self, step: ToolchainStep) -> Result<()> {
        self.calls.borrow_mut().push(step.to_string());
        match &self.fail_at {
            Some((failing, message)) if *failing == step => bail!("{}", message),
            _ => Ok(()),
        }
    }
}

impl Toolchain for MockToolchain {
    fn check_tools(&self, tools: &[ToolRequirement]) -> Result<(), RecipeError> {
        match tools.iter().find(|tool| self.missing_tool.as_deref() == Some(tool.name.as_str())) {
            Some(tool) => Err(RecipeError::MissingTool {
                name: tool.name.clone(),
                requirement: tool.version_req.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn generate(&self, request: &GenerateRequest<'_>) -> Result<ToolchainFiles> {
        self.requests.borrow_mut().push(RecordedRequest {
            platform: *request.platform,
            options: request.options.clone(),
            dependency_prefixes: request
                .dependencies
                .iter()
                .map(|d| d.prefix().to_path_buf())
                .collect(),
        });
        self.enter(ToolchainStep::Generate)?;
        Ok(ToolchainFiles {
            toolchain_file: request.layout.build_dir.join("toolchain.cmake"),
            layout: request.layout.clone(),
            build_type: request.platform.build_type,
        })
    }

    fn build(&self, files: &ToolchainFiles) -> Result<BuildArtifacts> {
        self.enter(ToolchainStep::Build)?;
        Ok(BuildArtifacts {
            layout: files.layout.clone(),
            build_type: files.build_type,
        })
    }

    fn install(&self, artifacts: &BuildArtifacts) -> Result<InstalledLayout> {
        self.enter(ToolchainStep::Install)?;
        Ok(InstalledLayout {
            prefix: artifacts.layout.install_prefix.clone(),
        })
    }
}

/// Resolver over a fixed list of packages.
#[derive(Debug, Default)]
pub struct MockResolver {
    packages: Vec<InstalledPackage>,
}

impl MockResolver {
    pub fn new() -> Self {
        MockResolver::default()
    }

    pub fn with_package(mut self, package: InstalledPackage) -> Self {
        self.packages.push(package);
        self
    }

    fn find(&self, req: &DependencyRequirement) -> Option<&InstalledPackage> {
        self.packages.iter().find(|pkg| {
            pkg.name == req.name
                && Version::parse(&pkg.version).map_or(false, |v| req.version_req.matches(&v))
        })
    }
}

impl DependencyResolver for MockResolver {
    fn resolve(
        &self,
        requirements: &[DependencyRequirement],
        _platform: &PlatformSpec,
    ) -> Result<Vec<ResolvedDependency>, RecipeError> {
        requirements
            .iter()
            .map(|req| match self.find(req) {
                Some(pkg) => Ok(ResolvedDependency {
                    requirement: req.clone(),
                    package: pkg.clone(),
                }),
                None => Err(RecipeError::MissingDependency {
                    name: req.name.clone(),
                    requirement: req.version_req.to_string(),
                    reason: "not known to the mock resolver".to_string(),
                }),
            })
            .collect()
    }
}
