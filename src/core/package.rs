//! Installed packages and their consumption metadata.
//!
//! A created package lives at `<packages_dir>/<name>/<version>/<package_id>/`
//! and carries a `package_info.json` describing how dependents link it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::identity::ComponentIdentity;
use crate::core::options::OptionSet;
use crate::core::recipe::{PackageInfoSection, PackageMetadata};
use crate::core::settings::PlatformSpec;
use crate::util::fs::{read_to_string, write_string};
use crate::util::hash::Fingerprint;

/// Metadata file written into every install prefix.
pub const PACKAGE_INFO_FILE: &str = "package_info.json";

/// What a dependent needs to consume a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionInfo {
    pub libs: Vec<String>,
    #[serde(default)]
    pub bindirs: Vec<String>,
    #[serde(default)]
    pub includedirs: Vec<String>,
    #[serde(default)]
    pub libdirs: Vec<String>,
}

impl From<&PackageInfoSection> for ConsumptionInfo {
    fn from(section: &PackageInfoSection) -> Self {
        ConsumptionInfo {
            libs: section.libs.clone(),
            bindirs: section.bindirs.clone(),
            includedirs: section.includedirs.clone(),
            libdirs: section.libdirs.clone(),
        }
    }
}

/// Descriptive fields carried from `[package]` into the installed record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDetails {
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

impl From<&PackageMetadata> for PackageDetails {
    fn from(package: &PackageMetadata) -> Self {
        PackageDetails {
            description: package.description.clone(),
            license: package.license.clone(),
            author: package.author.clone(),
            topics: package.topics.clone(),
            homepage: package.homepage.clone(),
            url: package.url.clone(),
        }
    }
}

/// Contents of `package_info.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub package_id: String,
    pub settings: PlatformSpec,
    pub options: OptionSet,
    pub cpp_info: ConsumptionInfo,
    #[serde(flatten)]
    pub details: PackageDetails,
    /// Install prefix; not serialized, filled in on load.
    #[serde(skip)]
    pub prefix: PathBuf,
}

impl InstalledPackage {
    pub fn identity(&self) -> ComponentIdentity {
        ComponentIdentity {
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }

    /// Absolute include directories under the prefix.
    pub fn include_paths(&self) -> Vec<PathBuf> {
        self.cpp_info.includedirs.iter().map(|d| self.prefix.join(d)).collect()
    }

    /// Absolute library directories under the prefix.
    pub fn lib_paths(&self) -> Vec<PathBuf> {
        self.cpp_info.libdirs.iter().map(|d| self.prefix.join(d)).collect()
    }

    /// Read `package_info.json` from an install prefix.
    pub fn load(prefix: &Path) -> Result<Self> {
        let path = prefix.join(PACKAGE_INFO_FILE);
        let content = read_to_string(&path)?;
        let mut package: InstalledPackage = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        package.prefix = prefix.to_path_buf();
        Ok(package)
    }

    /// Write `package_info.json` into `self.prefix`.
    pub fn save(&self) -> Result<PathBuf> {
        let path = self.prefix.join(PACKAGE_INFO_FILE);
        let content =
            serde_json::to_string_pretty(self).context("failed to serialize package info")?;
        write_string(&path, &content)?;
        Ok(path)
    }
}

/// Compute the id of a binary package.
///
/// The id depends only on identity, settings and the final option set, so
/// equal configurations map to the same install prefix.
pub fn package_id(
    identity: &ComponentIdentity,
    platform: &PlatformSpec,
    options: &OptionSet,
) -> String {
    let mut fp = Fingerprint::new();
    fp.update_pair("name", &identity.name)
        .update_pair("version", &identity.version)
        .update_pair("os", platform.os.as_str())
        .update_pair("arch", platform.arch.as_str())
        .update_pair("compiler", platform.compiler.as_str())
        .update_pair("build_type", platform.build_type.as_str());
    for (name, value) in options.iter() {
        fp.update_pair(name, &value.to_string());
    }
    fp.finish_id()
}

/// Install prefix for a package inside the package store.
pub fn install_prefix(packages_dir: &Path, identity: &ComponentIdentity, id: &str) -> PathBuf {
    packages_dir.join(&identity.name).join(&identity.version).join(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::{Arch, Os};
    use crate::test_support::fixtures::regxmllib_identity;
    use tempfile::TempDir;

    #[test]
    fn test_package_id_is_stable() {
        let platform = PlatformSpec::new(Os::Linux, Arch::X86_64);
        let options = OptionSet::new().with("shared", true).with("fPIC", true);

        let a = package_id(&regxmllib_identity(), &platform, &options);
        let b = package_id(&regxmllib_identity(), &platform, &options.clone());
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
    }

    #[test]
    fn test_package_id_depends_on_configuration() {
        let linux = PlatformSpec::new(Os::Linux, Arch::X86_64);
        let mac = PlatformSpec::new(Os::Macos, Arch::X86_64);
        let shared = OptionSet::new().with("shared", true);
        let static_ = OptionSet::new().with("shared", false);

        let base = package_id(&regxmllib_identity(), &linux, &shared);
        assert_ne!(base, package_id(&regxmllib_identity(), &mac, &shared));
        assert_ne!(base, package_id(&regxmllib_identity(), &linux, &static_));
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let package = InstalledPackage {
            name: "xerces-c".to_string(),
            version: "3.2.5".to_string(),
            package_id: "abc".to_string(),
            settings: PlatformSpec::new(Os::Linux, Arch::X86_64),
            options: OptionSet::new().with("network", false).with("shared", false),
            cpp_info: ConsumptionInfo {
                libs: vec!["xerces-c".to_string()],
                includedirs: vec!["include".to_string()],
                libdirs: vec!["lib".to_string()],
                ..Default::default()
            },
            details: PackageDetails {
                license: Some("Apache-2.0".to_string()),
                author: Some("Apache Software Foundation".to_string()),
                topics: vec!["xml".to_string(), "parser".to_string()],
                homepage: Some("https://xerces.apache.org/xerces-c/".to_string()),
                ..Default::default()
            },
            prefix: tmp.path().to_path_buf(),
        };

        let path = package.save().unwrap();
        assert_eq!(path, tmp.path().join(PACKAGE_INFO_FILE));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["author"], "Apache Software Foundation");
        assert_eq!(json["topics"][1], "parser");
        assert!(json.get("description").is_none());
        assert!(json.get("url").is_none());

        let loaded = InstalledPackage::load(tmp.path()).unwrap();
        assert_eq!(loaded, package);
        assert_eq!(loaded.include_paths(), vec![tmp.path().join("include")]);
    }
}
