//! `quay new` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::NewArgs;
use quay::ops::quay_new::{new_recipe, NewOptions};

pub fn execute(args: NewArgs) -> Result<()> {
    let path = args.path.unwrap_or_else(|| PathBuf::from(&args.name));

    let opts = NewOptions {
        name: args.name.clone(),
        init: args.init,
    };
    new_recipe(&path, &opts)?;

    eprintln!("     Created recipe `{}` in {}", args.name, path.display());
    Ok(())
}
