//! `modfleet validate` and `modfleet expand` commands

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::{Format, ManifestArgs};
use modfleet::core::MANIFEST_NAME;
use modfleet::ops::{expand_file, validate_file};
use modfleet::util::GlobalContext;

pub fn validate(args: ManifestArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let path = manifest_path(&ctx, args.manifest);

    let manifest = validate_file(&path)?;
    let modules = manifest.modules().count();

    match args.format {
        Format::Json => {
            let report = serde_json::json!({
                "valid": true,
                "path": path,
                "modules": modules,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Text => println!("ok: {} ({} modules)", path.display(), modules),
    }
    Ok(())
}

pub fn expand(args: ManifestArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let path = manifest_path(&ctx, args.manifest);

    let manifest = expand_file(&path)?;
    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&manifest)?),
        Format::Text => print!("{}", manifest.to_toml_string()?),
    }
    Ok(())
}

fn manifest_path(ctx: &GlobalContext, manifest: Option<PathBuf>) -> PathBuf {
    match manifest {
        Some(path) => ctx.resolve_path(&path),
        None => ctx.cwd().join(MANIFEST_NAME),
    }
}
