//! Dependency requirements declared by a recipe.
//!
//! A requirement states what the recipe needs from another package: a
//! version range and the options it forces on that package regardless of
//! the package's own defaults. The requirement is handed opaquely to the
//! dependency resolver.

use std::fmt;

use semver::VersionReq;
use serde::{Deserialize, Serialize};

use crate::core::options::{OptionSet, OptionValue};

/// How a dependency must be linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    Static,
    Shared,
}

impl LinkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkMode::Static => "static",
            LinkMode::Shared => "shared",
        }
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The CMake package and imported target used to find a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindSpec {
    pub package: String,
    pub target: String,
}

/// A dependency declared by a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRequirement {
    pub name: String,
    #[serde(rename = "version")]
    pub version_req: VersionReq,
    #[serde(rename = "network", default = "default_network")]
    pub network_allowed: bool,
    #[serde(rename = "link", default = "default_link")]
    pub link_mode: LinkMode,
    /// Extra options forced on the dependency.
    #[serde(default, rename = "options")]
    pub extra_options: OptionSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find: Option<FindSpec>,
}

fn default_network() -> bool {
    true
}

fn default_link() -> LinkMode {
    LinkMode::Static
}

impl DependencyRequirement {
    pub fn new(name: impl Into<String>, version_req: VersionReq) -> Self {
        DependencyRequirement {
            name: name.into(),
            version_req,
            network_allowed: default_network(),
            link_mode: default_link(),
            extra_options: OptionSet::new(),
            find: None,
        }
    }

    pub fn with_network(mut self, allowed: bool) -> Self {
        self.network_allowed = allowed;
        self
    }

    pub fn with_link_mode(mut self, mode: LinkMode) -> Self {
        self.link_mode = mode;
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.extra_options.insert(name, value);
        self
    }

    pub fn with_find(mut self, package: impl Into<String>, target: impl Into<String>) -> Self {
        self.find = Some(FindSpec {
            package: package.into(),
            target: target.into(),
        });
        self
    }

    /// All options forced on the dependency.
    ///
    /// `network` and `shared` always reflect the typed fields; other entries
    /// come from the recipe's extra options.
    pub fn options_override(&self) -> OptionSet {
        let mut options = self.extra_options.clone();
        options.insert("network", self.network_allowed);
        options.insert("shared", self.link_mode == LinkMode::Shared);
        options
    }

    /// The CMake lookup for this dependency, defaulting to `name::name`.
    pub fn find_spec(&self) -> FindSpec {
        self.find.clone().unwrap_or_else(|| FindSpec {
            package: self.name.clone(),
            target: format!("{}::{}", self.name, self.name),
        })
    }
}

impl fmt::Display for DependencyRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/[{}] {}", self.name, self.version_req, self.options_override())
    }
}

/// A build tool needed on the host, such as `cmake` or `ninja`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequirement {
    pub name: String,
    #[serde(rename = "version")]
    pub version_req: VersionReq,
}
