//! Workspace scanning for module roots.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use walkdir::{DirEntry, WalkDir};

use crate::core::module::DiscoveredModule;
use crate::discovery::filter::PathFilter;
use crate::modfile::{self, ModFile};
use crate::util::cancel::CancelToken;

/// Number of path separators in `rel`, i.e. its depth below the root.
fn depth(rel: &Path) -> usize {
    rel.components().count().saturating_sub(1)
}

fn relative<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Find module roots under `root`.
///
/// Directories deeper than `max_depth` separators, hidden directories and
/// excluded directories are pruned with their whole subtree. A `go.mod`
/// that cannot be read or declares no module is skipped. Modules nested
/// inside another discovered module are dropped.
pub fn scan_modules(
    root: &Path,
    max_depth: Option<usize>,
    filter: &PathFilter,
    cancel: &CancelToken,
) -> Result<Vec<DiscoveredModule>> {
    if !root.is_dir() {
        bail!("workspace root is not a directory: {}", root.display());
    }

    let too_deep = |rel: &Path| max_depth.is_some_and(|max| depth(rel) > max);

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if !entry.file_type().is_dir() {
                return true;
            }
            let rel = relative(root, entry.path());
            !is_hidden(entry) && !too_deep(rel) && !(entry.depth() > 0 && filter.is_excluded(rel))
        });

    let mut modules = Vec::new();

    for entry in walker {
        cancel.check()?;

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("skipping unreadable path: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() || entry.file_name() != modfile::FILE_NAME {
            continue;
        }
        if too_deep(relative(root, entry.path())) {
            continue;
        }

        let Some(dir) = entry.path().parent() else {
            continue;
        };
        if !filter.matches(relative(root, dir)) {
            continue;
        }

        match ModFile::load(entry.path()) {
            Ok(parsed) => match parsed.module_path() {
                Some(identifier) => {
                    modules.push(DiscoveredModule::new(dir.to_path_buf(), identifier));
                }
                None => tracing::debug!("no module directive in {}", entry.path().display()),
            },
            Err(e) => tracing::debug!("skipping {}: {:#}", entry.path().display(), e),
        }
    }

    Ok(drop_nested(modules))
}

/// Remove modules located inside another module's directory.
pub fn drop_nested(modules: Vec<DiscoveredModule>) -> Vec<DiscoveredModule> {
    let roots: HashSet<PathBuf> = modules.iter().map(|m| m.location.clone()).collect();

    modules
        .into_iter()
        .filter(|m| {
            let nested = m.location.ancestors().skip(1).any(|a| roots.contains(a));
            if nested {
                tracing::debug!("ignoring nested module {}", m.location.display());
            }
            !nested
        })
        .collect()
}
