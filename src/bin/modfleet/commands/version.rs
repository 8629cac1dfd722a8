//! `modfleet version` command

use anyhow::{Context, Result};

use crate::cli::{Format, VersionArgs};
use modfleet::ops::{resolve_version, VersionOptions};
use modfleet::util::GlobalContext;
use modfleet::{CancelToken, VersionResolution};

pub fn execute(args: VersionArgs, verbose: bool, cancel: &CancelToken) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(verbose);

    let opts = VersionOptions {
        strategy: args.strategy,
        workspace: args.workspace,
        allow_network: args.allow_network,
        ..VersionOptions::default()
    };

    tracing::debug!("resolving {} with strategy {}", args.module, opts.strategy);

    let resolution = resolve_version(&ctx, &args.module, &opts, cancel)
        .with_context(|| format!("failed to resolve version of `{}`", args.module))?;

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&resolution)?),
        Format::Text => println!("{}", summary(&resolution)),
    }
    Ok(())
}

/// `v1.4.2 (network: tags)`
fn summary(resolution: &VersionResolution) -> String {
    match &resolution.source_path {
        Some(path) => format!("{} ({}: {})", resolution.version, resolution.source, path),
        None => format!("{} ({})", resolution.version, resolution.source),
    }
}
