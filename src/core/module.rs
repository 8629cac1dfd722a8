//! Module identifiers and the repositories they live in.
//!
//! A Go module path such as `github.com/acme/platform/tools/cli` names a
//! hosting provider, an owner and a repository in its first three segments;
//! anything beyond that is the module's directory inside the repository.

use std::path::PathBuf;

use serde::Serialize;

/// A module root found during a local scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredModule {
    /// Directory containing the `go.mod` file
    pub location: PathBuf,

    /// Module path declared by the `module` directive
    pub identifier: String,

    /// Repository inferred from the module path
    pub inferred_repository: String,
}

impl DiscoveredModule {
    pub fn new(location: PathBuf, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let inferred_repository = infer_repository(&identifier);
        DiscoveredModule {
            location,
            identifier,
            inferred_repository,
        }
    }
}

/// Whether the first path segment looks like a hostname.
fn has_host(identifier: &str) -> bool {
    identifier
        .split('/')
        .next()
        .is_some_and(|first| first.contains('.'))
}

/// Repository (`host/owner/name`) a module path lives in.
///
/// Module paths that do not start with a hostname, or have fewer than three
/// segments, are returned unchanged.
pub fn infer_repository(identifier: &str) -> String {
    let segments: Vec<&str> = identifier.split('/').collect();
    if has_host(identifier) && segments.len() >= 3 {
        segments[..3].join("/")
    } else {
        identifier.to_string()
    }
}

/// Directory of a module within its repository, `"."` for the root.
pub fn path_within_repo(identifier: &str) -> String {
    let segments: Vec<&str> = identifier.split('/').collect();
    if has_host(identifier) && segments.len() > 3 {
        segments[3..].join("/")
    } else {
        ".".to_string()
    }
}

/// HTTPS clone URL for a `host/owner/name` repository.
pub fn clone_url(repository: &str) -> String {
    format!("https://{}.git", repository.trim_end_matches(".git"))
}

/// Split a `host/owner/name` repository into `(host, owner, name)`.
pub fn split_repository(repository: &str) -> Option<(&str, &str, &str)> {
    let mut parts = repository.splitn(4, '/');
    let host = parts.next()?;
    let owner = parts.next()?;
    let name = parts.next()?;
    if parts.next().is_some() || host.is_empty() || owner.is_empty() || name.is_empty() {
        return None;
    }
    Some((host, owner, name))
}
