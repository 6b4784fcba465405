//! Configuration file support for Quay.
//!
//! Quay reads two configuration files:
//! - Global: `~/.quay/config.toml` - User-wide defaults
//! - Project: `.quay/config.toml` next to the recipe - Project overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::settings::{Arch, BuildType, Compiler, Os, PlatformSpec};

/// Quay configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default target platform
    pub profile: ProfileConfig,

    /// Build settings
    pub build: BuildConfig,
}

/// Default settings used when the command line does not name them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub os: Option<Os>,
    pub arch: Option<Arch>,
    pub compiler: Option<Compiler>,
    pub build_type: Option<BuildType>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// CMake generator overriding the recipe's
    pub generator: Option<String>,

    /// Default number of parallel jobs (None = let the generator decide)
    pub jobs: Option<usize>,

    /// Root of the installed package store
    pub packages_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.profile.os.is_some() {
            self.profile.os = other.profile.os;
        }
        if other.profile.arch.is_some() {
            self.profile.arch = other.profile.arch;
        }
        if other.profile.compiler.is_some() {
            self.profile.compiler = other.profile.compiler;
        }
        if other.profile.build_type.is_some() {
            self.profile.build_type = other.profile.build_type;
        }

        if other.build.generator.is_some() {
            self.build.generator = other.build.generator;
        }
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.packages_dir.is_some() {
            self.build.packages_dir = other.build.packages_dir;
        }
    }

    /// The platform described by the profile, falling back to the host.
    pub fn platform(&self) -> Result<PlatformSpec> {
        let os = self
            .profile
            .os
            .or_else(Os::host)
            .context("cannot detect the host operating system, pass --os")?;
        let arch = self
            .profile
            .arch
            .or_else(Arch::host)
            .context("cannot detect the host architecture, pass --arch")?;
        let mut platform = PlatformSpec::new(os, arch);
        if let Some(compiler) = self.profile.compiler {
            platform = platform.with_compiler(compiler);
        }
        if let Some(build_type) = self.profile.build_type {
            platform = platform.with_build_type(build_type);
        }
        Ok(platform)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.quay/config.toml)
/// 2. Global config (~/.quay/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }
    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global quay config directory (~/.quay).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".quay"))
}

/// Get the project config path (.quay/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".quay").join("config.toml")
}
