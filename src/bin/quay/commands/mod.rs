//! Command implementations

pub mod completions;
pub mod create;
pub mod descriptor;
pub mod info;
pub mod new;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use quay::core::recipe::RECIPE_FILE;
use quay::util::GlobalContext;

/// Locate the recipe: `--path` if given, else search upward from cwd.
pub fn recipe_path(ctx: &GlobalContext, path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(dir) => {
            let candidate = dir.join(RECIPE_FILE);
            if !candidate.is_file() {
                bail!(
                    "could not find {} in {}\n\
                     help: Run `quay new <name>` to create a recipe",
                    RECIPE_FILE,
                    dir.display()
                );
            }
            Ok(candidate)
        }
        None => ctx.find_recipe(),
    }
}

