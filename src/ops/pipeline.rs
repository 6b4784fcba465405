//! The recipe pipeline.
//!
//! A [`RecipePipeline`] owns one configuration pass over one recipe and
//! moves forward through
//! `Unconfigured → Validated → OptionsResolved → DescriptorReady → Built → Installed`.
//! The first stage error moves it to `Failed`, which keeps the error and
//! refuses every further step.
//!
//! [`RecipePipeline::configure`] only reads the recipe and its manifest.
//! Installed packages and host tools are consulted by
//! [`RecipePipeline::resolve_dependencies`], which must run before the
//! descriptor is synthesized.

use std::fmt;
use std::path::PathBuf;

use crate::builder::descriptor::{synthesize, SynthesisOutcome};
use crate::builder::toolchain::{BuildArtifacts, BuildLayout, GenerateRequest, Toolchain};
use crate::core::dependency::DependencyRequirement;
use crate::core::errors::{RecipeError, ToolchainStep};
use crate::core::identity::{resolve_identity, ComponentIdentity};
use crate::core::options::OptionSet;
use crate::core::package::{
    install_prefix, package_id, ConsumptionInfo, InstalledPackage, PackageDetails,
};
use crate::core::recipe::Recipe;
use crate::core::settings::PlatformSpec;
use crate::ops::options::resolve_options;
use crate::ops::requirements::declare_requirements;
use crate::ops::validate::validate_platform;
use crate::resolver::{DependencyResolver, ResolvedDependency};

/// Where the pipeline is.
#[derive(Debug, Clone)]
pub enum PipelineState {
    Unconfigured,
    Validated,
    OptionsResolved,
    DescriptorReady,
    Built,
    Installed,
    /// Terminal. `at` names the state the failing step started from.
    Failed { at: &'static str, error: RecipeError },
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Unconfigured => "unconfigured",
            PipelineState::Validated => "validated",
            PipelineState::OptionsResolved => "options-resolved",
            PipelineState::DescriptorReady => "descriptor-ready",
            PipelineState::Built => "built",
            PipelineState::Installed => "installed",
            PipelineState::Failed { .. } => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PipelineState::Failed { .. })
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs supplied by the caller.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub platform: PlatformSpec,
    /// `name=value` option overrides, applied on top of the defaults.
    pub overrides: Vec<(String, String)>,
    pub packages_dir: PathBuf,
    /// Build tree root; defaults to `<recipe root>/.quay/build`.
    pub build_root: Option<PathBuf>,
}

impl PipelineSettings {
    pub fn new(platform: PlatformSpec, packages_dir: impl Into<PathBuf>) -> Self {
        PipelineSettings {
            platform,
            overrides: Vec::new(),
            packages_dir: packages_dir.into(),
            build_root: None,
        }
    }

    pub fn with_override(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((name.into(), value.into()));
        self
    }
}

/// The finalized configuration produced by [`RecipePipeline::configure`].
///
/// Read-only from here on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub identity: ComponentIdentity,
    pub platform: PlatformSpec,
    /// Options after overrides, before pruning.
    pub requested: OptionSet,
    /// Options after pruning.
    pub options: OptionSet,
    /// Declared, not yet resolved.
    pub requirements: Vec<DependencyRequirement>,
    pub package_id: String,
}

/// Drives one recipe from configuration to an installed package.
pub struct RecipePipeline<'a> {
    recipe: &'a Recipe,
    toolchain: &'a dyn Toolchain,
    resolver: &'a dyn DependencyResolver,
    settings: PipelineSettings,
    state: PipelineState,
    configuration: Option<Configuration>,
    dependencies: Option<Vec<ResolvedDependency>>,
    descriptor: Option<SynthesisOutcome>,
    artifacts: Option<BuildArtifacts>,
    installed: Option<InstalledPackage>,
}

impl<'a> RecipePipeline<'a> {
    pub fn new(
        recipe: &'a Recipe,
        toolchain: &'a dyn Toolchain,
        resolver: &'a dyn DependencyResolver,
        settings: PipelineSettings,
    ) -> Self {
        RecipePipeline {
            recipe,
            toolchain,
            resolver,
            settings,
            state: PipelineState::Unconfigured,
            configuration: None,
            dependencies: None,
            descriptor: None,
            artifacts: None,
            installed: None,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// The error that failed the pipeline, if any.
    pub fn failure(&self) -> Option<&RecipeError> {
        match &self.state {
            PipelineState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }

    /// Resolved dependencies, once [`resolve_dependencies`](Self::resolve_dependencies) ran.
    pub fn dependencies(&self) -> Option<&[ResolvedDependency]> {
        self.dependencies.as_deref()
    }

    pub fn descriptor(&self) -> Option<&SynthesisOutcome> {
        self.descriptor.as_ref()
    }

    pub fn installed(&self) -> Option<&InstalledPackage> {
        self.installed.as_ref()
    }

    /// What dependents link against. Known statically from the recipe.
    pub fn consumption_info(&self) -> ConsumptionInfo {
        ConsumptionInfo::from(&self.recipe.package_info)
    }

    /// Resolve identity, validate the platform, prune options and declare
    /// requirements. Nothing is written to disk and the package store is
    /// not consulted.
    pub fn configure(&mut self) -> Result<&Configuration, RecipeError> {
        self.require(matches!(self.state, PipelineState::Unconfigured), "configure")?;
        let result = self.configure_inner();
        let configuration = self.record(result)?;
        Ok(&*self.configuration.insert(configuration))
    }

    fn configure_inner(&mut self) -> Result<Configuration, RecipeError> {
        let recipe = self.recipe;
        let platform = self.settings.platform;

        let source = recipe.package.version.source()?;
        let identity = resolve_identity(recipe.name(), source.as_ref(), &recipe.root)?;
        tracing::info!("Configuring {} for {}", identity, platform);

        let requested = recipe.requested_options(&self.settings.overrides)?;
        validate_platform(recipe.name(), &recipe.matrix, &platform, &requested)?;
        self.state = PipelineState::Validated;

        let options = resolve_options(&requested, &platform, &recipe.prune);
        tracing::debug!("options: {} -> {}", requested, options);
        self.state = PipelineState::OptionsResolved;

        let requirements = declare_requirements(recipe);
        let package_id = package_id(&identity, &platform, &options);
        tracing::info!("Configured {} with {} (package {})", identity, options, package_id);

        Ok(Configuration {
            identity,
            platform,
            requested,
            options,
            requirements,
            package_id,
        })
    }

    /// Find an installed package for every requirement and check the
    /// recipe's build tools. Failures here are configuration errors.
    pub fn resolve_dependencies(&mut self) -> Result<&[ResolvedDependency], RecipeError> {
        self.require(
            matches!(self.state, PipelineState::OptionsResolved) && self.dependencies.is_none(),
            "resolve dependencies",
        )?;
        let result = self.resolve_inner();
        let dependencies = self.record(result)?;
        Ok(self.dependencies.insert(dependencies).as_slice())
    }

    fn resolve_inner(&self) -> Result<Vec<ResolvedDependency>, RecipeError> {
        let config = self.configured()?;
        let dependencies = self.resolver.resolve(&config.requirements, &config.platform)?;
        for dep in &dependencies {
            tracing::debug!(
                "{} -> {} at {}",
                dep.requirement,
                dep.package.version,
                dep.prefix().display()
            );
        }
        self.toolchain.check_tools(&self.recipe.tool_requires)?;
        Ok(dependencies)
    }

    /// Write the build descriptor if the source tree has none.
    pub fn synthesize_descriptor(&mut self) -> Result<&SynthesisOutcome, RecipeError> {
        self.require(
            matches!(self.state, PipelineState::OptionsResolved) && self.dependencies.is_some(),
            "synthesize the descriptor",
        )?;
        let result = self
            .configured()
            .and_then(|config| synthesize(self.recipe, &config.identity));
        let outcome = self.record(result)?;
        self.state = PipelineState::DescriptorReady;
        Ok(&*self.descriptor.insert(outcome))
    }

    /// Run the toolchain's generate and build steps.
    pub fn build(&mut self) -> Result<(), RecipeError> {
        self.require(matches!(self.state, PipelineState::DescriptorReady), "build")?;
        let result = self.build_inner();
        let artifacts = self.record(result)?;
        self.artifacts = Some(artifacts);
        self.state = PipelineState::Built;
        tracing::info!("Built {}", self.recipe.name());
        Ok(())
    }

    fn build_inner(&self) -> Result<BuildArtifacts, RecipeError> {
        let config = self.configured()?;
        let dependencies = self
            .dependencies
            .as_deref()
            .ok_or_else(|| self.stage_order("build"))?;
        let layout = self.layout(config);
        let request = GenerateRequest {
            identity: &config.identity,
            platform: &config.platform,
            options: &config.options,
            dependencies,
            variables: &self.recipe.build.variables,
            layout: &layout,
        };

        let files = self
            .toolchain
            .generate(&request)
            .map_err(|e| toolchain_error(ToolchainStep::Generate, e))?;
        self.toolchain
            .build(&files)
            .map_err(|e| toolchain_error(ToolchainStep::Build, e))
    }

    /// Run the toolchain's install step and write the consumption metadata.
    pub fn install(&mut self) -> Result<&InstalledPackage, RecipeError> {
        self.require(matches!(self.state, PipelineState::Built), "install")?;
        let result = self.install_inner();
        let package = self.record(result)?;
        self.state = PipelineState::Installed;
        tracing::info!("Installed {} into {}", package.identity(), package.prefix.display());
        Ok(&*self.installed.insert(package))
    }

    fn install_inner(&self) -> Result<InstalledPackage, RecipeError> {
        let config = self.configured()?;
        let artifacts = self.artifacts.as_ref().ok_or_else(|| self.stage_order("install"))?;

        let layout = self
            .toolchain
            .install(artifacts)
            .map_err(|e| toolchain_error(ToolchainStep::Install, e))?;

        let package = InstalledPackage {
            name: config.identity.name.clone(),
            version: config.identity.version.clone(),
            package_id: config.package_id.clone(),
            settings: config.platform,
            options: config.options.clone(),
            cpp_info: self.consumption_info(),
            details: PackageDetails::from(&self.recipe.package),
            prefix: layout.prefix,
        };
        package
            .save()
            .map_err(|e| toolchain_error(ToolchainStep::Install, e))?;
        Ok(package)
    }

    /// Run every remaining step through `Installed`.
    pub fn run(&mut self) -> Result<&InstalledPackage, RecipeError> {
        if matches!(self.state, PipelineState::Unconfigured) {
            self.configure()?;
        }
        if matches!(self.state, PipelineState::OptionsResolved) && self.dependencies.is_none() {
            self.resolve_dependencies()?;
        }
        if matches!(self.state, PipelineState::OptionsResolved) {
            self.synthesize_descriptor()?;
        }
        if matches!(self.state, PipelineState::DescriptorReady) {
            self.build()?;
        }
        self.install()
    }

    fn layout(&self, config: &Configuration) -> BuildLayout {
        let build_root = self
            .settings
            .build_root
            .clone()
            .unwrap_or_else(|| self.recipe.root.join(".quay").join("build"));
        BuildLayout {
            source_dir: self.recipe.root.clone(),
            build_dir: build_root.join(&config.package_id),
            install_prefix: install_prefix(
                &self.settings.packages_dir,
                &config.identity,
                &config.package_id,
            ),
        }
    }

    fn configured(&self) -> Result<&Configuration, RecipeError> {
        self.configuration
            .as_ref()
            .ok_or_else(|| self.stage_order("continue"))
    }

    fn stage_order(&self, operation: &'static str) -> RecipeError {
        RecipeError::StageOrder {
            operation,
            state: self.state.name().to_string(),
        }
    }

    /// Out-of-order calls are rejected without failing the pipeline.
    fn require(&self, ok: bool, operation: &'static str) -> Result<(), RecipeError> {
        if ok {
            Ok(())
        } else {
            Err(self.stage_order(operation))
        }
    }

    /// Move to `Failed` if `result` is an error.
    fn record<T>(&mut self, result: Result<T, RecipeError>) -> Result<T, RecipeError> {
        if let Err(error) = &result {
            tracing::debug!("pipeline failed while {}: {}", self.state, error);
            self.state = PipelineState::Failed {
                at: self.state.name(),
                error: error.clone(),
            };
        }
        result
    }
}

fn toolchain_error(step: ToolchainStep, error: anyhow::Error) -> RecipeError {
    RecipeError::Toolchain {
        step,
        message: format!("{:#}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::PlatformDimension;
    use crate::core::settings::{Arch, Os};
    use crate::test_support::fixtures::{
        write_regxmllib_project, xerces_package, REGXMLLIB_RECIPE,
    };
    use crate::test_support::{MockResolver, MockToolchain};
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        recipe: Recipe,
        toolchain: MockToolchain,
        resolver: MockResolver,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let root = write_regxmllib_project(tmp.path());
            let recipe = Recipe::parse(REGXMLLIB_RECIPE, &root).unwrap();
            let resolver = MockResolver::new().with_package(xerces_package(tmp.path()));
            Fixture {
                tmp,
                recipe,
                toolchain: MockToolchain::new(),
                resolver,
            }
        }

        fn settings(&self, os: Os, arch: Arch) -> PipelineSettings {
            PipelineSettings::new(PlatformSpec::new(os, arch), self.tmp.path().join("packages"))
        }

        fn pipeline(&self, settings: PipelineSettings) -> RecipePipeline<'_> {
            RecipePipeline::new(&self.recipe, &self.toolchain, &self.resolver, settings)
        }

        fn descriptor_path(&self) -> PathBuf {
            self.recipe.root.join("CMakeLists.txt")
        }
    }

    #[test]
    fn test_linux_shared_build_installs() {
        let fx = Fixture::new();
        let mut pipeline = fx.pipeline(fx.settings(Os::Linux, Arch::X86_64));

        let config = pipeline.configure().unwrap();
        assert_eq!(config.identity.version, "1.1.5");
        assert_eq!(config.options, OptionSet::new().with("shared", true).with("fPIC", true));

        let package = pipeline.run().unwrap().clone();
        assert!(matches!(pipeline.state(), PipelineState::Installed));
        assert_eq!(fx.toolchain.calls(), vec!["generate", "build", "install"]);

        assert_eq!(package.cpp_info.libs, vec!["regxmllibc"]);
        assert!(package.cpp_info.bindirs.is_empty());
        assert!(package.prefix.join("package_info.json").is_file());
        assert!(fx.descriptor_path().is_file());
        assert_eq!(package.details.license.as_deref(), Some("BSD-2-Clause"));
        assert_eq!(package.details.topics, vec!["mxf", "regxml", "smpte"]);
        assert_eq!(
            package.details.homepage.as_deref(),
            Some("https://github.com/sandflow/regxmllib")
        );

        let reloaded = InstalledPackage::load(&package.prefix).unwrap();
        assert_eq!(reloaded.details, package.details);

        let generated = fx.toolchain.last_request().unwrap();
        assert_eq!(generated.dependency_prefixes.len(), 1);
        assert_eq!(generated.options, package.options);
    }

    #[test]
    fn test_windows_shared_halts_before_side_effects() {
        let fx = Fixture::new();
        let mut pipeline =
            fx.pipeline(fx.settings(Os::Windows, Arch::X86_64).with_override("shared", "True"));

        let err = pipeline.run().unwrap_err();
        assert!(matches!(
            err,
            RecipeError::UnsupportedPlatform {
                dimension: PlatformDimension::OptionCombination,
                ..
            }
        ));
        assert!(matches!(
            pipeline.state(),
            PipelineState::Failed { at: "unconfigured", .. }
        ));
        assert!(!fx.descriptor_path().exists());
        assert!(fx.toolchain.calls().is_empty());
        assert!(pipeline.configuration().is_none());
    }

    #[test]
    fn test_macos_static_prunes_fpic() {
        let fx = Fixture::new();
        let mut pipeline =
            fx.pipeline(fx.settings(Os::Macos, Arch::Armv8).with_override("shared", "false"));

        let config = pipeline.configure().unwrap();
        assert_eq!(config.options, OptionSet::new().with("shared", false));
        assert_eq!(
            config.requested,
            OptionSet::new().with("shared", false).with("fPIC", true)
        );
        assert!(matches!(pipeline.state(), PipelineState::OptionsResolved));
    }

    #[test]
    fn test_windows_static_passes_without_fpic() {
        let fx = Fixture::new();
        let mut pipeline =
            fx.pipeline(fx.settings(Os::Windows, Arch::Armv8).with_override("shared", "false"));
        let config = pipeline.configure().unwrap();
        assert!(!config.options.contains("fPIC"));
    }

    #[test]
    fn test_missing_manifest_version_fails_configuration() {
        let fx = Fixture::new();
        std::fs::write(fx.recipe.root.join("pom.xml"), "<project></project>\n").unwrap();
        let mut pipeline = fx.pipeline(fx.settings(Os::Linux, Arch::X86_64));

        let err = pipeline.configure().unwrap_err();
        assert!(matches!(err, RecipeError::ManifestVersionNotFound { .. }));
        assert!(matches!(pipeline.failure(), Some(RecipeError::ManifestVersionNotFound { .. })));
    }

    #[test]
    fn test_build_failure_is_terminal() {
        let fx = Fixture {
            toolchain: MockToolchain::failing_at(ToolchainStep::Build, "ninja: build stopped"),
            ..Fixture::new()
        };
        let mut pipeline = fx.pipeline(fx.settings(Os::Linux, Arch::X86_64));

        let err = pipeline.run().unwrap_err();
        match &err {
            RecipeError::Toolchain { step, message } => {
                assert_eq!(*step, ToolchainStep::Build);
                assert!(message.contains("ninja: build stopped"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(matches!(pipeline.state(), PipelineState::Failed { at: "descriptor-ready", .. }));
        assert_eq!(fx.toolchain.calls(), vec!["generate", "build"]);

        // No later stage may run, and nothing is retried.
        let again = pipeline.install().unwrap_err();
        assert!(matches!(again, RecipeError::StageOrder { .. }));
        assert_eq!(fx.toolchain.calls(), vec!["generate", "build"]);
        assert!(fx.descriptor_path().is_file());
    }

    #[test]
    fn test_generate_failure_skips_build() {
        let fx = Fixture {
            toolchain: MockToolchain::failing_at(ToolchainStep::Generate, "CMake Error"),
            ..Fixture::new()
        };
        let mut pipeline = fx.pipeline(fx.settings(Os::Linux, Arch::X86_64));

        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, RecipeError::Toolchain { step: ToolchainStep::Generate, .. }));
        assert!(matches!(pipeline.state(), PipelineState::Failed { at: "descriptor-ready", .. }));
        assert_eq!(fx.toolchain.calls(), vec!["generate"]);
    }

    #[test]
    fn test_install_failure_writes_no_package_info() {
        let fx = Fixture {
            toolchain: MockToolchain::failing_at(ToolchainStep::Install, "permission denied"),
            ..Fixture::new()
        };
        let mut pipeline = fx.pipeline(fx.settings(Os::Linux, Arch::X86_64));

        let err = pipeline.run().unwrap_err();
        match &err {
            RecipeError::Toolchain { step, message } => {
                assert_eq!(*step, ToolchainStep::Install);
                assert!(message.contains("permission denied"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(matches!(pipeline.state(), PipelineState::Failed { at: "built", .. }));
        assert_eq!(fx.toolchain.calls(), vec!["generate", "build", "install"]);
        assert!(pipeline.installed().is_none());

        let config = pipeline.configuration().unwrap();
        let packages = fx.tmp.path().join("packages");
        let prefix = install_prefix(&packages, &config.identity, &config.package_id);
        assert!(!prefix.join("package_info.json").exists());

        let again = pipeline.install().unwrap_err();
        assert!(matches!(again, RecipeError::StageOrder { operation: "install", .. }));
        assert_eq!(fx.toolchain.calls().len(), 3);
    }

    #[test]
    fn test_configure_does_not_resolve_dependencies() {
        let fx = Fixture {
            resolver: MockResolver::new(),
            ..Fixture::new()
        };
        let mut pipeline = fx.pipeline(fx.settings(Os::Linux, Arch::X86_64));

        let config = pipeline.configure().unwrap();
        assert_eq!(config.requirements.len(), 1);
        assert_eq!(config.requirements[0].name, "xerces-c");
        assert!(pipeline.dependencies().is_none());

        // The descriptor waits for resolution.
        let err = pipeline.synthesize_descriptor().unwrap_err();
        assert!(matches!(err, RecipeError::StageOrder { .. }));
        assert!(matches!(pipeline.state(), PipelineState::OptionsResolved));
    }

    #[test]
    fn test_missing_dependency_fails_resolution() {
        let fx = Fixture {
            resolver: MockResolver::new(),
            ..Fixture::new()
        };
        let mut pipeline = fx.pipeline(fx.settings(Os::Linux, Arch::X86_64));
        pipeline.configure().unwrap();

        let err = pipeline.resolve_dependencies().unwrap_err();
        assert!(matches!(err, RecipeError::MissingDependency { .. }));
        assert!(err.is_configuration_error());
        assert!(matches!(pipeline.state(), PipelineState::Failed { at: "options-resolved", .. }));
        assert!(!fx.descriptor_path().exists());
        assert!(fx.toolchain.calls().is_empty());
    }

    #[test]
    fn test_missing_tool_fails_before_side_effects() {
        let fx = Fixture {
            toolchain: MockToolchain::missing_tool("ninja"),
            ..Fixture::new()
        };
        let mut pipeline = fx.pipeline(fx.settings(Os::Linux, Arch::X86_64));

        let err = pipeline.run().unwrap_err();
        assert!(matches!(
            err,
            RecipeError::MissingTool { ref name, ref requirement }
                if name == "ninja" && requirement == ">=1.11.1"
        ));
        assert!(err.is_configuration_error());
        assert!(matches!(pipeline.state(), PipelineState::Failed { at: "options-resolved", .. }));
        assert!(fx.toolchain.calls().is_empty());
        assert!(!fx.descriptor_path().exists());
    }

    #[test]
    fn test_steps_must_run_in_order() {
        let fx = Fixture::new();
        let mut pipeline = fx.pipeline(fx.settings(Os::Linux, Arch::X86_64));

        let err = pipeline.build().unwrap_err();
        assert!(matches!(err, RecipeError::StageOrder { operation: "build", .. }));
        assert!(matches!(pipeline.state(), PipelineState::Unconfigured));

        pipeline.configure().unwrap();
        assert!(matches!(pipeline.configure(), Err(RecipeError::StageOrder { .. })));
        assert!(fx.toolchain.calls().is_empty());
    }

    #[test]
    fn test_existing_descriptor_is_kept() {
        let fx = Fixture::new();
        std::fs::write(fx.descriptor_path(), "project(custom)\n").unwrap();
        let mut pipeline = fx.pipeline(fx.settings(Os::Linux, Arch::X86_64));

        pipeline.configure().unwrap();
        pipeline.resolve_dependencies().unwrap();
        let outcome = pipeline.synthesize_descriptor().unwrap();
        assert!(!outcome.was_written());
        assert_eq!(
            std::fs::read_to_string(fx.descriptor_path()).unwrap(),
            "project(custom)\n"
        );
    }

    #[test]
    fn test_unknown_override_is_rejected() {
        let fx = Fixture::new();
        let mut pipeline =
            fx.pipeline(fx.settings(Os::Linux, Arch::X86_64).with_override("lto", "true"));
        assert!(matches!(
            pipeline.configure(),
            Err(RecipeError::UnknownOption { .. })
        ));
    }
}
