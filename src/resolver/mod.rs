//! Version resolution.
//!
//! A [`VersionResolver`] answers "what version of this module should the
//! fleet move to?". [`LocalVersionResolver`] reads what local modules pin
//! or asks the module proxy; [`RemoteVersionResolver`] reads tags from the
//! hosting provider, the module proxy or the git remote directly.
//!
//! Every resolution returns a [`VersionResolution`] carrying its provenance
//! and the warnings gathered along the way, even on success.

pub mod local;
pub mod remote;
pub mod version;

use thiserror::Error;

use crate::core::resolution::VersionResolution;
use crate::hosting::ProviderError;
use crate::util::cancel::{CancelToken, Cancelled};

pub use local::{LocalStrategy, LocalVersionResolver};
pub use remote::{RemoteStrategy, RemoteVersionResolver};

/// Why a version could not be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("network access is disabled (pass --allow-network or set `network.allow = true`)")]
    NetworkDisabled,

    #[error("no local module pins `{module}`")]
    NotFoundLocally { module: String },

    #[error("repository `{repository}` has no tags")]
    NoTags { repository: String },

    #[error("repository `{repository}` has {count} tags but none is a semantic version")]
    NoValidVersions { repository: String, count: usize },

    #[error("no versions of `{module}` are published")]
    NoVersions { module: String },

    #[error("could not parse the version listing for `{module}`: {output}")]
    UnparseableListing { module: String, output: String },

    #[error("`{module}` is not hosted on {host}")]
    UnsupportedModule { module: String, host: String },

    #[error("could not resolve a version for `{module}`: {}", warnings.join("; "))]
    Exhausted { module: String, warnings: Vec<String> },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error(transparent)]
    Other(anyhow::Error),
}

impl ResolveError {
    /// Warnings gathered before the failure.
    pub fn warnings(&self) -> &[String] {
        match self {
            ResolveError::Exhausted { warnings, .. } => warnings,
            _ => &[],
        }
    }

    /// Whether the failure is a cancellation, from any layer.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            ResolveError::Cancelled(_) | ResolveError::Provider(ProviderError::Cancelled(_))
        )
    }
}

impl From<anyhow::Error> for ResolveError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Cancelled>() {
            Ok(cancelled) => ResolveError::Cancelled(cancelled),
            Err(err) => ResolveError::Other(err),
        }
    }
}

/// Resolves the version of a module.
pub trait VersionResolver {
    fn resolve(&self, target: &str, cancel: &CancelToken) -> Result<VersionResolution, ResolveError>;
}

/// The available resolution engines.
pub enum VersionEngine {
    Local(LocalVersionResolver),
    Remote(RemoteVersionResolver),
}

impl VersionResolver for VersionEngine {
    fn resolve(&self, target: &str, cancel: &CancelToken) -> Result<VersionResolution, ResolveError> {
        match self {
            VersionEngine::Local(engine) => engine.resolve(target, cancel),
            VersionEngine::Remote(engine) => engine.resolve(target, cancel),
        }
    }
}

/// Versions listed for `module` in `go list -m -versions` output.
///
/// The output holds one line per module: the module path followed by its
/// versions. Other lines are ignored.
pub fn versions_from_listing(module: &str, output: &str) -> Result<Vec<String>, ResolveError> {
    let line = output
        .lines()
        .find(|line| line.split_whitespace().next() == Some(module))
        .ok_or_else(|| ResolveError::UnparseableListing {
            module: module.to_string(),
            output: output.trim().to_string(),
        })?;

    let versions: Vec<String> = line.split_whitespace().skip(1).map(str::to_string).collect();
    if versions.is_empty() {
        return Err(ResolveError::NoVersions {
            module: module.to_string(),
        });
    }
    Ok(versions)
}

/// Greatest valid version among `candidates`.
///
/// Distinguishes an empty list from a list with no valid entries.
pub fn latest_of(repository: &str, candidates: &[String]) -> Result<String, ResolveError> {
    if candidates.is_empty() {
        return Err(ResolveError::NoTags {
            repository: repository.to_string(),
        });
    }
    version::latest(candidates).ok_or_else(|| ResolveError::NoValidVersions {
        repository: repository.to_string(),
        count: candidates.len(),
    })
}
