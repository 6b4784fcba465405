//! `quay descriptor` command

use anyhow::Result;

use crate::cli::PathArgs;
use crate::commands::recipe_path;
use quay::builder::SynthesisOutcome;
use quay::ops::quay_create::descriptor;
use quay::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: PathArgs) -> Result<()> {
    let path = recipe_path(ctx, args.path.as_deref())?;

    match descriptor(&path)? {
        SynthesisOutcome::Written(file) => eprintln!("   Generated {}", file.display()),
        SynthesisOutcome::Skipped(file) => {
            eprintln!("     Skipped {} (already present)", file.display())
        }
    }
    Ok(())
}
