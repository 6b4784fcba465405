//! Global context for Quay operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::recipe::RECIPE_FILE;
use crate::util::config::{global_config_dir, load_config, project_config_path, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global Quay data (~/.quay/)
    home: PathBuf,

    verbose: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let home = std::env::var_os("QUAY_HOME")
            .map(PathBuf::from)
            .or_else(global_config_dir)
            .unwrap_or_else(|| PathBuf::from(".quay"));

        Ok(GlobalContext {
            cwd,
            home,
            verbose: false,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Override the Quay home directory.
    pub fn with_home(mut self, home: PathBuf) -> Self {
        self.home = home;
        self
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the Quay home directory (~/.quay/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Default root of the installed package store.
    pub fn default_packages_dir(&self) -> PathBuf {
        self.home.join("packages")
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Find Recipe.toml starting from cwd and searching upward.
    pub fn find_recipe(&self) -> Result<PathBuf> {
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(RECIPE_FILE);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                anyhow::bail!(
                    "could not find {} in {} or any parent directory",
                    RECIPE_FILE,
                    self.cwd.display()
                );
            }
        }
    }

    /// Load merged global and project configuration for a recipe root.
    pub fn load_config(&self, recipe_root: &Path) -> Config {
        load_config(&self.config_path(), &project_config_path(recipe_root))
    }

    /// Resolve the package store, preferring configuration over the default.
    pub fn packages_dir(&self, config: &Config) -> PathBuf {
        config
            .build
            .packages_dir
            .clone()
            .unwrap_or_else(|| self.default_packages_dir())
    }
}
