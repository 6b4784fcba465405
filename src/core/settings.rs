//! Build settings: operating system, architecture, compiler and build type.
//!
//! Settings are supplied from outside the recipe (CLI flags, config file or
//! host detection) and are read-only to the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a setting value has no known spelling.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`, known values: {known}")]
pub struct SettingParseError {
    pub kind: &'static str,
    pub value: String,
    pub known: String,
}

impl SettingParseError {
    fn new(kind: &'static str, value: &str, known: &[&str]) -> Self {
        SettingParseError {
            kind,
            value: value.to_string(),
            known: known.join(", "),
        }
    }
}

/// Serde through `FromStr` and `as_str`, so recipes and config files
/// accept the same spellings as the command line.
macro_rules! setting_serde {
    ($($ty:ident),*) => {$(
        impl TryFrom<String> for $ty {
            type Error = SettingParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.as_str().to_string()
            }
        }
    )*};
}

setting_serde!(Os, Arch, Compiler, BuildType);

/// Target operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Os {
    Windows,
    Linux,
    Macos,
    FreeBSD,
    Android,
    Ios,
}

impl Os {
    pub const ALL: [Os; 6] = [
        Os::Windows,
        Os::Linux,
        Os::Macos,
        Os::FreeBSD,
        Os::Android,
        Os::Ios,
    ];

    /// Canonical spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "Windows",
            Os::Linux => "Linux",
            Os::Macos => "Macos",
            Os::FreeBSD => "FreeBSD",
            Os::Android => "Android",
            Os::Ios => "iOS",
        }
    }

    /// Detect the host operating system.
    pub fn host() -> Option<Os> {
        match std::env::consts::OS {
            "windows" => Some(Os::Windows),
            "linux" => Some(Os::Linux),
            "macos" => Some(Os::Macos),
            "freebsd" => Some(Os::FreeBSD),
            "android" => Some(Os::Android),
            "ios" => Some(Os::Ios),
            _ => None,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = SettingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Os::ALL
            .into_iter()
            .find(|os| os.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<_> = Os::ALL.iter().map(|o| o.as_str()).collect();
                SettingParseError::new("os", s, &known)
            })
    }
}

/// Target CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Arch {
    X86,
    X86_64,
    Armv7,
    Armv8,
    Wasm,
    Riscv64,
}

impl Arch {
    pub const ALL: [Arch; 6] = [
        Arch::X86,
        Arch::X86_64,
        Arch::Armv7,
        Arch::Armv8,
        Arch::Wasm,
        Arch::Riscv64,
    ];

    /// Canonical spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::Armv7 => "armv7",
            Arch::Armv8 => "armv8",
            Arch::Wasm => "wasm",
            Arch::Riscv64 => "riscv64",
        }
    }

    /// Detect the host architecture.
    pub fn host() -> Option<Arch> {
        match std::env::consts::ARCH {
            "x86" => Some(Arch::X86),
            "x86_64" => Some(Arch::X86_64),
            "arm" => Some(Arch::Armv7),
            "aarch64" => Some(Arch::Armv8),
            "wasm32" => Some(Arch::Wasm),
            "riscv64" => Some(Arch::Riscv64),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = SettingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = match s.to_ascii_lowercase().as_str() {
            // Common aliases from other ecosystems
            "amd64" => "x86_64".to_string(),
            "aarch64" | "arm64" => "armv8".to_string(),
            other => other.to_string(),
        };
        Arch::ALL
            .into_iter()
            .find(|arch| arch.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Arch::ALL.iter().map(|a| a.as_str()).collect();
                SettingParseError::new("arch", &s, &known)
            })
    }
}

/// Compiler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Compiler {
    Gcc,
    Clang,
    AppleClang,
    Msvc,
}

impl Compiler {
    pub const ALL: [Compiler; 4] = [
        Compiler::Gcc,
        Compiler::Clang,
        Compiler::AppleClang,
        Compiler::Msvc,
    ];

    /// Canonical spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Compiler::Gcc => "gcc",
            Compiler::Clang => "clang",
            Compiler::AppleClang => "apple-clang",
            Compiler::Msvc => "msvc",
        }
    }

    /// The usual compiler for an operating system.
    pub fn default_for(os: Os) -> Compiler {
        match os {
            Os::Windows => Compiler::Msvc,
            Os::Macos | Os::Ios => Compiler::AppleClang,
            Os::Android => Compiler::Clang,
            Os::Linux | Os::FreeBSD => Compiler::Gcc,
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compiler {
    type Err = SettingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Compiler::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<_> = Compiler::ALL.iter().map(|c| c.as_str()).collect();
                SettingParseError::new("compiler", s, &known)
            })
    }
}

/// CMake-style build configuration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    pub const ALL: [BuildType; 4] = [
        BuildType::Debug,
        BuildType::Release,
        BuildType::RelWithDebInfo,
        BuildType::MinSizeRel,
    ];

    /// Canonical spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = SettingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildType::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<_> = BuildType::ALL.iter().map(|b| b.as_str()).collect();
                SettingParseError::new("build_type", s, &known)
            })
    }
}

/// The full set of settings a recipe is configured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub os: Os,
    pub arch: Arch,
    pub compiler: Compiler,
    pub build_type: BuildType,
}

impl PlatformSpec {
    /// Create a platform with the default compiler for `os` and a release build.
    pub fn new(os: Os, arch: Arch) -> Self {
        PlatformSpec {
            os,
            arch,
            compiler: Compiler::default_for(os),
            build_type: BuildType::default(),
        }
    }

    /// Detect the host platform, if it is one of the known values.
    pub fn host() -> Option<Self> {
        Some(PlatformSpec::new(Os::host()?, Arch::host()?))
    }

    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = build_type;
        self
    }
}

impl fmt::Display for PlatformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "os={} arch={} compiler={} build_type={}",
            self.os, self.arch, self.compiler, self.build_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_parse_is_case_insensitive() {
        assert_eq!("linux".parse::<Os>().unwrap(), Os::Linux);
        assert_eq!("Macos".parse::<Os>().unwrap(), Os::Macos);
        assert_eq!("ios".parse::<Os>().unwrap(), Os::Ios);
    }

    #[test]
    fn test_os_parse_error_lists_known_values() {
        let err = "Haiku".parse::<Os>().unwrap_err();
        assert_eq!(err.value, "Haiku");
        assert!(err.known.contains("Windows"));
        assert!(err.to_string().contains("unknown os `Haiku`"));
    }

    #[test]
    fn test_arch_aliases() {
        assert_eq!("aarch64".parse::<Arch>().unwrap(), Arch::Armv8);
        assert_eq!("arm64".parse::<Arch>().unwrap(), Arch::Armv8);
        assert_eq!("AMD64".parse::<Arch>().unwrap(), Arch::X86_64);
        assert!("sparc".parse::<Arch>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for os in Os::ALL {
            assert_eq!(os.to_string().parse::<Os>().unwrap(), os);
        }
        for arch in Arch::ALL {
            assert_eq!(arch.to_string().parse::<Arch>().unwrap(), arch);
        }
        for compiler in Compiler::ALL {
            assert_eq!(compiler.to_string().parse::<Compiler>().unwrap(), compiler);
        }
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let spec = PlatformSpec::new(Os::Macos, Arch::Armv8);
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(
            json,
            r#"{"os":"Macos","arch":"armv8","compiler":"apple-clang","build_type":"Release"}"#
        );
    }

    #[test]
    fn test_serde_accepts_any_case() {
        let spec: PlatformSpec = serde_json::from_str(
            r#"{"os":"macos","arch":"ARMV8","compiler":"Apple-Clang","build_type":"debug"}"#,
        )
        .unwrap();
        assert_eq!(
            spec,
            PlatformSpec::new(Os::Macos, Arch::Armv8).with_build_type(BuildType::Debug)
        );

        let os: Os = serde_json::from_str(r#""IOS""#).unwrap();
        assert_eq!(os, Os::Ios);
        let arch: Arch = serde_json::from_str(r#""aarch64""#).unwrap();
        assert_eq!(arch, Arch::Armv8);

        let err = serde_json::from_str::<Os>(r#""Haiku""#).unwrap_err();
        assert!(err.to_string().contains("unknown os `Haiku`"));
    }

    #[test]
    fn test_default_compiler_per_os() {
        assert_eq!(PlatformSpec::new(Os::Windows, Arch::X86_64).compiler, Compiler::Msvc);
        assert_eq!(PlatformSpec::new(Os::Linux, Arch::X86_64).compiler, Compiler::Gcc);
    }
}
