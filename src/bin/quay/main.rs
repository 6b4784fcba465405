//! Quay CLI - a recipe engine for C and C++ libraries

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use quay::util::diagnostic::emit;
use quay::{GlobalContext, RecipeError};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        match e.downcast_ref::<RecipeError>() {
            Some(err) => emit(&err.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("quay=debug")
    } else {
        EnvFilter::new("quay=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(cli.verbose);

    match cli.command {
        Commands::Validate(args) => commands::validate::execute(&ctx, args),
        Commands::Descriptor(args) => commands::descriptor::execute(&ctx, args),
        Commands::Create(args) => commands::create::execute(&ctx, args),
        Commands::Info(args) => commands::info::execute(&ctx, args),
        Commands::New(args) => commands::new::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
