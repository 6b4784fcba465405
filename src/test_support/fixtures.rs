//! Test fixtures for common test scenarios.

use std::path::{Path, PathBuf};

use crate::core::identity::ComponentIdentity;
use crate::core::options::OptionSet;
use crate::core::package::{
    install_prefix, package_id, ConsumptionInfo, InstalledPackage, PackageDetails,
};
use crate::core::settings::{Arch, Os, PlatformSpec};

/// Recipe for a C++ XML library whose version lives in a Maven pom.
pub const REGXMLLIB_RECIPE: &str = r#"
[package]
name = "regxmllib"
version = { manifest = "pom.xml" }
description = "Converts MXF header metadata to RegXML documents"
license = "BSD-2-Clause"
topics = ["mxf", "regxml", "smpte"]
homepage = "https://github.com/sandflow/regxmllib"

[settings]
os = ["Windows", "Linux", "Macos"]
arch = ["x86_64", "armv8"]

[options.shared]
values = [true, false]
default = true

[options.fPIC]
values = [true, false]
default = true

[[conflicts]]
when = { os = "Windows", options = { shared = true } }
reason = "shared builds are not supported on Windows"

[[prune]]
remove = "fPIC"
when = { os = "Windows" }

[[prune]]
remove = "fPIC"
when = { options = { shared = false } }

[[requires]]
name = "xerces-c"
version = ">=3.2.5"
network = false
link = "static"
find = { package = "XercesC", target = "XercesC::XercesC" }

[[tool_requires]]
name = "cmake"
version = ">=3.21.1"

[[tool_requires]]
name = "ninja"
version = ">=1.11.1"

[build]
variables = { BUILD_TESTING = false }

[descriptor]
language = "CXX"
sources = "src/main/cpp"
extensions = ["cpp", "h"]

[package_info]
libs = ["regxmllibc"]
"#;

/// A pom.xml whose first version tag is the project's.
pub const REGXMLLIB_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>com.sandflow</groupId>
    <artifactId>regxmllib</artifactId>
    <version>1.1.5</version>
    <dependencies>
        <dependency>
            <artifactId>junit</artifactId>
            <version>4.13.2</version>
        </dependency>
    </dependencies>
</project>
"#;

pub fn regxmllib_identity() -> ComponentIdentity {
    ComponentIdentity {
        name: "regxmllib".to_string(),
        version: "1.1.5".to_string(),
    }
}

/// Write the regxmllib source tree under `base` and return its root.
pub fn write_regxmllib_project(base: &Path) -> PathBuf {
    let root = base.join("regxmllib");
    let src = root.join("src/main/cpp/com/sandflow/smpte/regxml");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(root.join("Recipe.toml"), REGXMLLIB_RECIPE).unwrap();
    std::fs::write(root.join("pom.xml"), REGXMLLIB_POM).unwrap();
    std::fs::write(
        src.join("FragmentBuilder.h"),
        "#pragma once\nclass FragmentBuilder {};\n",
    )
    .unwrap();
    std::fs::write(
        src.join("FragmentBuilder.cpp"),
        "#include \"FragmentBuilder.h\"\n",
    )
    .unwrap();
    root
}

/// Install a package record into a package store without building anything.
pub fn install_fake_package(
    packages_dir: &Path,
    name: &str,
    version: &str,
    platform: &PlatformSpec,
    options: &OptionSet,
) -> InstalledPackage {
    let identity = ComponentIdentity {
        name: name.to_string(),
        version: version.to_string(),
    };
    let id = package_id(&identity, platform, options);
    let package = InstalledPackage {
        name: name.to_string(),
        version: version.to_string(),
        package_id: id.clone(),
        settings: *platform,
        options: options.clone(),
        cpp_info: ConsumptionInfo {
            libs: vec![name.to_string()],
            bindirs: Vec::new(),
            includedirs: vec!["include".to_string()],
            libdirs: vec!["lib".to_string()],
        },
        details: PackageDetails::default(),
        prefix: install_prefix(packages_dir, &identity, &id),
    };
    package.save().unwrap();
    package
}

/// A static, network-less xerces-c 3.2.5 for Linux x86_64 under `base/packages`.
pub fn xerces_package(base: &Path) -> InstalledPackage {
    install_fake_package(
        &base.join("packages"),
        "xerces-c",
        "3.2.5",
        &PlatformSpec::new(Os::Linux, Arch::X86_64),
        &OptionSet::new().with("network", false).with("shared", false),
    )
}
