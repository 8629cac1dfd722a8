//! `modfleet discover` command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::{DiscoverArgs, DiscoverCommands, DiscoverCommon, DiscoverFormat};
use modfleet::core::{Dependent, DependentDescriptor};
use modfleet::ops::{discover_local, discover_remote, DiscoverOptions};
use modfleet::util::GlobalContext;
use modfleet::CancelToken;

pub fn execute(args: DiscoverArgs, verbose: bool, cancel: &CancelToken) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(verbose);

    match args.command {
        DiscoverCommands::Local(args) => {
            let root = args.root.unwrap_or_else(|| PathBuf::from("."));
            let mut opts = options(&args.common);
            opts.max_depth = args.max_depth;

            let found = discover_local(&ctx, &root, &opts, cancel)?;
            print(&found, args.common.format, Some(&ctx.resolve_path(&root)))
        }
        DiscoverCommands::Remote(args) => {
            let mut opts = options(&args.common);
            opts.query = args.query;

            let found = discover_remote(&ctx, &args.org, &opts, cancel)?;
            print(&found, args.common.format, None)
        }
    }
}

fn options(common: &DiscoverCommon) -> DiscoverOptions {
    DiscoverOptions {
        target_version: common.older_than.clone(),
        include: common.include.clone(),
        exclude: common.exclude.clone(),
        limit: common.limit,
        jobs: common.jobs,
        ..DiscoverOptions::new(&common.target)
    }
}

#[derive(Serialize)]
struct DependentList {
    dependents: Vec<Dependent>,
}

fn print(found: &[DependentDescriptor], format: DiscoverFormat, root: Option<&Path>) -> Result<()> {
    match format {
        DiscoverFormat::Json => {
            println!("{}", serde_json::to_string_pretty(found)?);
        }
        DiscoverFormat::Toml => {
            let list = DependentList {
                dependents: found.iter().cloned().map(DependentDescriptor::into_dependent).collect(),
            };
            print!(
                "{}",
                toml::to_string_pretty(&list).context("failed to render dependents")?
            );
        }
        DiscoverFormat::Text => {
            if found.is_empty() {
                eprintln!("no dependents found");
            }
            for dependent in found {
                println!("{}", text_line(dependent, root));
            }
        }
    }
    Ok(())
}

/// `module  version  location`, the location relative to the scanned root.
fn text_line(dependent: &DependentDescriptor, root: Option<&Path>) -> String {
    let version = dependent.current_version.as_deref().unwrap_or("-");
    let location = match (dependent.local_path.as_deref(), root) {
        (Some(path), Some(root)) => pathdiff::diff_paths(path, root)
            .filter(|rel| !rel.as_os_str().is_empty())
            .unwrap_or_else(|| path.to_path_buf())
            .display()
            .to_string(),
        (Some(path), None) => path.display().to_string(),
        (None, _) if dependent.module_path == "." => dependent.repository.clone(),
        (None, _) => format!("{}/{}", dependent.repository, dependent.module_path),
    };
    format!("{}  {}  {}", dependent.module, version, location)
}
