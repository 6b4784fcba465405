//! Rule records evaluated against settings and options.
//!
//! Rules are plain data of the form `{ when, action }` loaded from the
//! recipe, so the compatibility matrix and pruning policy can be tested and
//! extended without touching control flow.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::options::{OptionSet, OptionValue};
use crate::core::settings::{Arch, BuildType, Compiler, Os, PlatformSpec};

/// A conjunction of setting and option tests.
///
/// An empty condition matches everything. Option entries match only when the
/// option is present with exactly that value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<Os>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<Arch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<Compiler>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_type: Option<BuildType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, OptionValue>,
}

impl Condition {
    pub fn os(os: Os) -> Self {
        Condition {
            os: Some(os),
            ..Default::default()
        }
    }

    pub fn option(name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        Condition::default().and_option(name, value)
    }

    pub fn and_option(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Evaluate the condition.
    pub fn matches(&self, platform: &PlatformSpec, options: &OptionSet) -> bool {
        self.os.map_or(true, |os| os == platform.os)
            && self.arch.map_or(true, |arch| arch == platform.arch)
            && self.compiler.map_or(true, |c| c == platform.compiler)
            && self.build_type.map_or(true, |b| b == platform.build_type)
            && self
                .options
                .iter()
                .all(|(name, value)| options.get(name) == Some(value))
    }

    /// Render the tested fields, e.g. `os=Windows, shared=true`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(os) = self.os {
            parts.push(format!("os={}", os));
        }
        if let Some(arch) = self.arch {
            parts.push(format!("arch={}", arch));
        }
        if let Some(compiler) = self.compiler {
            parts.push(format!("compiler={}", compiler));
        }
        if let Some(build_type) = self.build_type {
            parts.push(format!("build_type={}", build_type));
        }
        for (name, value) in &self.options {
            parts.push(format!("{}={}", name, value));
        }
        parts.join(", ")
    }
}

/// A disallowed combination of settings and options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRule {
    pub when: Condition,
    pub reason: String,
}

/// Removes an option whenever its condition holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneRule {
    pub when: Condition,
    pub remove: String,
}

impl PruneRule {
    pub fn new(when: Condition, remove: impl Into<String>) -> Self {
        PruneRule {
            when,
            remove: remove.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_condition_matches_everything() {
        let platform = PlatformSpec::new(Os::Linux, Arch::X86_64);
        assert!(Condition::default().matches(&platform, &OptionSet::new()));
    }

    #[test]
    fn test_option_condition_requires_presence() {
        let platform = PlatformSpec::new(Os::Linux, Arch::X86_64);
        let cond = Condition::option("shared", false);
        assert!(!cond.matches(&platform, &OptionSet::new()));
        assert!(cond.matches(&platform, &OptionSet::new().with("shared", false)));
        assert!(!cond.matches(&platform, &OptionSet::new().with("shared", true)));
    }

    #[test]
    fn test_combined_condition() {
        let cond = Condition::os(Os::Windows).and_option("shared", true);
        let shared = OptionSet::new().with("shared", true);
        assert!(cond.matches(&PlatformSpec::new(Os::Windows, Arch::X86_64), &shared));
        assert!(!cond.matches(&PlatformSpec::new(Os::Linux, Arch::X86_64), &shared));
        assert_eq!(cond.describe(), "os=Windows, shared=true");
    }

    #[test]
    fn test_condition_from_toml() {
        let rule: PruneRule =
            toml::from_str("remove = \"fPIC\"\n[when]\nos = \"Windows\"\n").unwrap();
        assert_eq!(rule.when, Condition::os(Os::Windows));
        assert_eq!(rule.remove, "fPIC");

        let bad = toml::from_str::<Condition>("platform = \"Windows\"");
        assert!(bad.is_err());
    }
}
