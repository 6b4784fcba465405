//! `quay validate` command

use anyhow::{Context, Result};
use serde_json::json;

use crate::cli::{OutputFormat, ValidateArgs};
use crate::commands::recipe_path;
use quay::ops::pipeline::Configuration;
use quay::ops::quay_create::validate;
use quay::util::GlobalContext;

pub fn execute(ctx: &GlobalContext, args: ValidateArgs) -> Result<()> {
    let path = recipe_path(ctx, args.settings.path.as_deref())?;

    let config = validate(ctx, &path, &args.settings.to_options())?;
    match args.format {
        OutputFormat::Text => print!("{}", format_text(&config, ctx.is_verbose())),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&to_json(&config))
                .context("failed to serialize configuration")?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn format_text(config: &Configuration, verbose: bool) -> String {
    let mut out = format!("{}\n", config.identity);
    out.push_str(&format!("  settings:   {}\n", config.platform));
    out.push_str(&format!("  options:    {}\n", config.options));
    if verbose && config.requested != config.options {
        out.push_str(&format!("  requested:  {}\n", config.requested));
    }
    for req in &config.requirements {
        out.push_str(&format!("  requires:   {} ({})\n", req, req.link_mode));
    }
    out.push_str(&format!("  package id: {}\n", config.package_id));
    out
}

fn to_json(config: &Configuration) -> serde_json::Value {
    let requires: Vec<_> = config
        .requirements
        .iter()
        .map(|req| {
            json!({
                "name": req.name,
                "requirement": req.version_req.to_string(),
                "link": req.link_mode,
                "options": req.options_override(),
            })
        })
        .collect();

    json!({
        "name": config.identity.name,
        "version": config.identity.version,
        "settings": config.platform,
        "requested_options": config.requested,
        "options": config.options,
        "requires": requires,
        "package_id": config.package_id,
    })
}
