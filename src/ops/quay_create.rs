//! Implementation of `quay create`, `quay validate` and `quay descriptor`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::cmake::CMakeToolchain;
use crate::builder::descriptor::{synthesize, SynthesisOutcome};
use crate::core::identity::resolve_identity;
use crate::core::package::InstalledPackage;
use crate::core::recipe::Recipe;
use crate::core::settings::{Arch, BuildType, Compiler, Os};
use crate::ops::pipeline::{Configuration, PipelineSettings, RecipePipeline};
use crate::resolver::InstalledPackages;
use crate::util::config::Config;
use crate::util::context::GlobalContext;

/// Options shared by `quay validate` and `quay create`.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Target settings; unset values come from config, then the host.
    pub os: Option<Os>,
    pub arch: Option<Arch>,
    pub compiler: Option<Compiler>,
    pub build_type: Option<BuildType>,

    /// `name=value` option overrides
    pub overrides: Vec<(String, String)>,

    /// Number of parallel build jobs
    pub jobs: Option<usize>,

    /// Package store override
    pub packages_dir: Option<PathBuf>,

    /// Build tree override
    pub build_root: Option<PathBuf>,
}

impl CreateOptions {
    /// Apply command-line settings on top of loaded configuration.
    fn apply(&self, config: &mut Config) {
        let profile = &mut config.profile;
        profile.os = self.os.or(profile.os);
        profile.arch = self.arch.or(profile.arch);
        profile.compiler = self.compiler.or(profile.compiler);
        profile.build_type = self.build_type.or(profile.build_type);

        if self.jobs.is_some() {
            config.build.jobs = self.jobs;
        }
        if self.packages_dir.is_some() {
            config.build.packages_dir = self.packages_dir.clone();
        }
    }
}

/// A loaded recipe with the configuration and settings for one run.
pub struct Session {
    pub recipe: Recipe,
    pub config: Config,
    pub settings: PipelineSettings,
}

impl Session {
    pub fn load(ctx: &GlobalContext, recipe_path: &Path, opts: &CreateOptions) -> Result<Self> {
        let recipe = Recipe::load(recipe_path)?;
        let mut config = ctx.load_config(&recipe.root);
        opts.apply(&mut config);

        let platform = config.platform()?;
        let mut settings = PipelineSettings::new(platform, ctx.packages_dir(&config));
        settings.overrides = opts.overrides.clone();
        settings.build_root = opts.build_root.clone();

        Ok(Session {
            recipe,
            config,
            settings,
        })
    }

    /// The CMake driver, with the generator from config or the recipe.
    pub fn toolchain(&self) -> CMakeToolchain {
        let generator = self
            .config
            .build
            .generator
            .clone()
            .unwrap_or_else(|| self.recipe.build.generator.clone());
        CMakeToolchain::new(generator).jobs(self.config.build.jobs)
    }

    pub fn resolver(&self) -> InstalledPackages {
        InstalledPackages::new(&self.settings.packages_dir)
    }
}

/// Resolve a recipe's configuration without building or writing anything.
///
/// Requirements are declared but not looked up, so a recipe validates
/// before its dependencies are installed.
pub fn validate(
    ctx: &GlobalContext,
    recipe_path: &Path,
    opts: &CreateOptions,
) -> Result<Configuration> {
    let session = Session::load(ctx, recipe_path, opts)?;
    let toolchain = session.toolchain();
    let resolver = session.resolver();

    let mut pipeline =
        RecipePipeline::new(&session.recipe, &toolchain, &resolver, session.settings.clone());
    let config = pipeline.configure()?;
    Ok(config.clone())
}

/// Run the full pipeline and return the installed package.
pub fn create(
    ctx: &GlobalContext,
    recipe_path: &Path,
    opts: &CreateOptions,
) -> Result<InstalledPackage> {
    let session = Session::load(ctx, recipe_path, opts)?;
    let toolchain = session.toolchain();
    let resolver = session.resolver();

    let mut pipeline =
        RecipePipeline::new(&session.recipe, &toolchain, &resolver, session.settings.clone());
    let package = pipeline.run()?;
    Ok(package.clone())
}

/// Write the build descriptor for a recipe if its source tree has none.
pub fn descriptor(recipe_path: &Path) -> Result<SynthesisOutcome> {
    let recipe = Recipe::load(recipe_path)?;
    let source = recipe.package.version.source()?;
    let identity = resolve_identity(recipe.name(), source.as_ref(), &recipe.root)?;
    let outcome = synthesize(&recipe, &identity)
        .with_context(|| format!("failed to synthesize build descriptor for {}", identity))?;
    Ok(outcome)
}
