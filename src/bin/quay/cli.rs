//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use quay::core::settings::{Arch, BuildType, Compiler, Os};
use quay::ops::CreateOptions;

/// Quay - validate, configure and package C/C++ libraries from recipes
#[derive(Parser)]
#[command(name = "quay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve and print a recipe's configuration without building
    Validate(ValidateArgs),

    /// Write a CMakeLists.txt if the source tree has none
    Descriptor(PathArgs),

    /// Build and install a package from its recipe
    Create(CreateArgs),

    /// Print the consumption metadata dependents link against
    Info(PathArgs),

    /// Create a new recipe
    New(NewArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Target settings and option overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Target operating system (defaults to config, then the host)
    #[arg(long, env = "QUAY_OS")]
    pub os: Option<Os>,

    /// Target architecture
    #[arg(long, env = "QUAY_ARCH")]
    pub arch: Option<Arch>,

    /// Compiler
    #[arg(long)]
    pub compiler: Option<Compiler>,

    /// Build type
    #[arg(long)]
    pub build_type: Option<BuildType>,

    /// Option override (repeatable)
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub options: Vec<(String, String)>,

    /// Directory containing Recipe.toml (defaults to searching upward)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

impl SettingsArgs {
    pub fn to_options(&self) -> CreateOptions {
        CreateOptions {
            os: self.os,
            arch: self.arch,
            compiler: self.compiler,
            build_type: self.build_type,
            overrides: self.options.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Package store to install into and resolve dependencies from
    #[arg(long)]
    pub packages_dir: Option<PathBuf>,

    /// Build tree root (defaults to <recipe>/.quay/build)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct PathArgs {
    /// Directory containing Recipe.toml (defaults to searching upward)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct NewArgs {
    /// Component name
    pub name: String,

    /// Directory to create the recipe in (defaults to name)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Scaffold into an existing directory
    #[arg(long)]
    pub init: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

/// Parse a `name=value` option override.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing option name in `{}`", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("shared=False").unwrap(),
            ("shared".to_string(), "False".to_string())
        );
        assert_eq!(
            parse_key_val("variant = a=b").unwrap(),
            ("variant".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("shared").is_err());
        assert!(parse_key_val("=true").is_err());
    }

    #[test]
    fn test_settings_flags() {
        let cli = Cli::parse_from([
            "quay", "validate", "--os", "Windows", "--arch", "armv8", "-o", "shared=false",
            "--option", "fPIC=true", "--format", "json",
        ]);
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.settings.os, Some(Os::Windows));
        assert_eq!(args.settings.arch, Some(Arch::Armv8));
        assert_eq!(args.settings.options.len(), 2);
        assert_eq!(args.format, OutputFormat::Json);

        let opts = args.settings.to_options();
        assert_eq!(opts.overrides[0], ("shared".to_string(), "false".to_string()));
    }

    #[test]
    fn test_unknown_os_is_rejected() {
        assert!(Cli::try_parse_from(["quay", "validate", "--os", "Plan9"]).is_err());
    }

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
