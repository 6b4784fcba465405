//! `quay create` command

use anyhow::Result;

use crate::cli::CreateArgs;
use crate::commands::recipe_path;
use quay::ops::quay_create::create;
use quay::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: CreateArgs) -> Result<()> {
    let path = recipe_path(ctx, args.settings.path.as_deref())?;

    let mut opts = args.settings.to_options();
    opts.jobs = args.jobs;
    opts.packages_dir = args.packages_dir;
    opts.build_root = args.build_dir;

    let package = create(ctx, &path, &opts)?;
    eprintln!(
        "   Installed {} {} ({})",
        package.name, package.version, package.package_id
    );
    println!("{}", package.prefix.display());
    Ok(())
}
