//! Remote reference listing, the equivalent of `git ls-remote --tags`.

use anyhow::{Context, Result};
use git2::{Direction, Remote, RemoteCallbacks};

use crate::util::cancel::CancelToken;

/// Lists the references advertised by a remote repository.
pub trait RefLister: Send + Sync {
    /// Full reference names, e.g. `refs/tags/v1.0.0`.
    fn list_refs(&self, url: &str, cancel: &CancelToken) -> Result<Vec<String>>;
}

/// [`RefLister`] backed by libgit2, using a detached remote so no local
/// repository is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2RefLister;

impl RefLister for Git2RefLister {
    fn list_refs(&self, url: &str, cancel: &CancelToken) -> Result<Vec<String>> {
        cancel.check()?;
        tracing::debug!("listing remote refs of {}", url);

        let mut remote = Remote::create_detached(url)
            .with_context(|| format!("invalid remote URL: {}", url))?;

        let mut callbacks = RemoteCallbacks::new();
        callbacks.transfer_progress(|_| !cancel.is_cancelled());

        let refs = {
            let connection = remote
                .connect_auth(Direction::Fetch, Some(callbacks), None)
                .with_context(|| format!("failed to connect to {}", url))?;
            connection
                .list()
                .with_context(|| format!("failed to list refs of {}", url))?
                .iter()
                .map(|head| head.name().to_string())
                .collect::<Vec<_>>()
        };

        cancel.check()?;
        Ok(refs)
    }
}

/// Tag names from a reference listing.
///
/// Keeps `refs/tags/*`, drops the `^{}` entries that annotated tags
/// dereference to, and removes duplicates preserving order.
pub fn tag_names<S: AsRef<str>>(refs: &[S]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for name in refs {
        let Some(tag) = name.as_ref().strip_prefix("refs/tags/") else {
            continue;
        };
        if tag.ends_with("^{}") || tag.is_empty() {
            continue;
        }
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
