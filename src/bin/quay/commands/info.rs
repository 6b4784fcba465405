//! `quay info` command
//!
//! Prints what a dependent links against. Read straight from the recipe;
//! nothing is built.

use anyhow::{Context, Result};
use serde_json::json;

use crate::cli::PathArgs;
use crate::commands::recipe_path;
use quay::core::package::{ConsumptionInfo, PackageDetails};
use quay::core::recipe::Recipe;
use quay::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: PathArgs) -> Result<()> {
    let path = recipe_path(ctx, args.path.as_deref())?;
    let recipe = Recipe::load(&path)?;

    let details = PackageDetails::from(&recipe.package);
    let info = ConsumptionInfo::from(&recipe.package_info);
    let out = json!({
        "name": recipe.name(),
        "description": details.description,
        "license": details.license,
        "author": details.author,
        "topics": details.topics,
        "homepage": details.homepage,
        "url": details.url,
        "cpp_info": info,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&out).context("failed to serialize package info")?
    );
    Ok(())
}
