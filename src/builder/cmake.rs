//! CMake toolchain driver.
//!
//! `generate` writes a toolchain file translating settings and options into
//! CMake cache variables. `build` configures and compiles with it, and
//! `install` runs `cmake --install` into the package prefix.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::toolchain::{
    check_host_tools, BuildArtifacts, GenerateRequest, InstalledLayout, Toolchain, ToolchainFiles,
};
use crate::core::dependency::ToolRequirement;
use crate::core::errors::RecipeError;
use crate::core::options::OptionValue;
use crate::core::settings::{Arch, Os};
use crate::util::fs::{ensure_dir, write_string};
use crate::util::process::{find_cmake, ProcessBuilder};

/// Name of the generated toolchain file inside the build directory.
pub const TOOLCHAIN_FILE: &str = "quay_toolchain.cmake";

/// Drives CMake through generate, build and install.
#[derive(Debug, Clone)]
pub struct CMakeToolchain {
    generator: String,
    jobs: Option<usize>,
}

impl CMakeToolchain {
    pub fn new(generator: impl Into<String>) -> Self {
        CMakeToolchain {
            generator: generator.into(),
            jobs: None,
        }
    }

    /// Limit build parallelism.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn generator(&self) -> &str {
        &self.generator
    }

    fn cmake(&self) -> Result<PathBuf> {
        find_cmake().context(
            "CMake not found\n\
             \n\
             Install CMake and ensure it's in your PATH.",
        )
    }

    /// Arguments for the configure invocation.
    pub fn configure_args(&self, files: &ToolchainFiles) -> Vec<String> {
        vec![
            "-S".to_string(),
            files.layout.source_dir.display().to_string(),
            "-B".to_string(),
            files.layout.build_dir.display().to_string(),
            "-G".to_string(),
            self.generator.clone(),
            format!("-DCMAKE_TOOLCHAIN_FILE={}", cmake_path(&files.toolchain_file)),
        ]
    }

    /// Arguments for the compile invocation.
    pub fn build_args(&self, files: &ToolchainFiles) -> Vec<String> {
        let mut args = vec![
            "--build".to_string(),
            files.layout.build_dir.display().to_string(),
            "--config".to_string(),
            files.build_type.to_string(),
            "--parallel".to_string(),
        ];
        if let Some(jobs) = self.jobs {
            args.push(jobs.to_string());
        }
        args
    }
}

impl Toolchain for CMakeToolchain {
    fn check_tools(&self, tools: &[ToolRequirement]) -> Result<(), RecipeError> {
        check_host_tools(tools)
    }

    fn generate(&self, request: &GenerateRequest<'_>) -> Result<ToolchainFiles> {
        let layout = request.layout;
        ensure_dir(&layout.build_dir)?;

        let path = layout.build_dir.join(TOOLCHAIN_FILE);
        write_string(&path, &render_toolchain_file(request, Os::host()))?;
        tracing::debug!("wrote {}", path.display());

        Ok(ToolchainFiles {
            toolchain_file: path,
            layout: layout.clone(),
            build_type: request.platform.build_type,
        })
    }

    fn build(&self, files: &ToolchainFiles) -> Result<BuildArtifacts> {
        let cmake = self.cmake()?;

        tracing::info!("Configuring with CMake ({})", self.generator);
        ProcessBuilder::new(&cmake)
            .args(self.configure_args(files))
            .exec_and_check()
            .context("CMake configuration failed")?;

        tracing::info!("Building {}", files.build_type);
        ProcessBuilder::new(&cmake)
            .args(self.build_args(files))
            .exec_and_check()
            .context("CMake build failed")?;

        Ok(BuildArtifacts {
            layout: files.layout.clone(),
            build_type: files.build_type,
        })
    }

    fn install(&self, artifacts: &BuildArtifacts) -> Result<InstalledLayout> {
        let cmake = self.cmake()?;
        let prefix = &artifacts.layout.install_prefix;
        ensure_dir(prefix)?;

        tracing::info!("Installing into {}", prefix.display());
        ProcessBuilder::new(&cmake)
            .arg("--install")
            .arg(&artifacts.layout.build_dir)
            .arg("--config")
            .arg(artifacts.build_type.as_str())
            .arg("--prefix")
            .arg(prefix)
            .exec_and_check()
            .context("CMake install failed")?;

        Ok(InstalledLayout {
            prefix: prefix.clone(),
        })
    }
}

/// Render the toolchain file for a build.
///
/// `host` decides whether `CMAKE_SYSTEM_NAME` is set for a cross build.
/// Output depends only on the arguments.
pub fn render_toolchain_file(request: &GenerateRequest<'_>, host: Option<Os>) -> String {
    let platform = request.platform;
    let options = request.options;
    let mut out = String::new();

    out.push_str(&format!(
        "# Generated by quay for {}. Do not edit.\n",
        request.identity
    ));
    out.push_str(&format!("# {}\n", platform));
    out.push_str(&format!("# options: {}\n\n", options));

    if host != Some(platform.os) {
        out.push_str(&format!("set(CMAKE_SYSTEM_NAME {})\n", system_name(platform.os)));
        out.push_str(&format!("set(CMAKE_SYSTEM_PROCESSOR {})\n", processor(platform.arch)));
    }
    if platform.os == Os::Macos {
        if let Some(arch) = osx_architecture(platform.arch) {
            out.push_str(&format!(
                "set(CMAKE_OSX_ARCHITECTURES \"{}\" CACHE STRING \"\" FORCE)\n",
                arch
            ));
        }
    }

    out.push_str(&format!(
        "set(CMAKE_BUILD_TYPE \"{}\" CACHE STRING \"\" FORCE)\n",
        platform.build_type
    ));
    if let Some(shared) = options.get_bool("shared") {
        out.push_str(&cache_bool("BUILD_SHARED_LIBS", shared));
    }
    if let Some(pic) = options.get_bool("fPIC") {
        out.push_str(&cache_bool("CMAKE_POSITION_INDEPENDENT_CODE", pic));
    }
    out.push_str(&format!(
        "set(CMAKE_INSTALL_PREFIX \"{}\" CACHE PATH \"\" FORCE)\n",
        cmake_path(&request.layout.install_prefix)
    ));

    if !request.dependencies.is_empty() {
        let prefixes: Vec<String> = request
            .dependencies
            .iter()
            .map(|dep| cmake_path(dep.prefix()))
            .collect();
        out.push_str(&format!(
            "list(PREPEND CMAKE_PREFIX_PATH \"{}\")\n",
            prefixes.join(";")
        ));
    }

    if !request.variables.is_empty() {
        out.push('\n');
        for (name, value) in request.variables {
            match value {
                OptionValue::Bool(b) => out.push_str(&cache_bool(name, *b)),
                OptionValue::Text(s) => out.push_str(&format!(
                    "set({} \"{}\" CACHE STRING \"\" FORCE)\n",
                    name, s
                )),
            }
        }
    }

    out
}

fn cache_bool(name: &str, value: bool) -> String {
    format!(
        "set({} {} CACHE BOOL \"\" FORCE)\n",
        name,
        if value { "ON" } else { "OFF" }
    )
}

fn cmake_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

fn system_name(os: Os) -> &'static str {
    match os {
        Os::Windows => "Windows",
        Os::Linux => "Linux",
        Os::Macos => "Darwin",
        Os::FreeBSD => "FreeBSD",
        Os::Android => "Android",
        Os::Ios => "iOS",
    }
}

fn processor(arch: Arch) -> &'static str {
    match arch {
        Arch::X86 => "x86",
        Arch::X86_64 => "x86_64",
        Arch::Armv7 => "armv7",
        Arch::Armv8 => "aarch64",
        Arch::Wasm => "wasm32",
        Arch::Riscv64 => "riscv64",
    }
}

fn osx_architecture(arch: Arch) -> Option<&'static str> {
    match arch {
        Arch::X86 => Some("i386"),
        Arch::X86_64 => Some("x86_64"),
        Arch::Armv8 => Some("arm64"),
        _ => None,
    }
}
