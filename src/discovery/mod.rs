//! Dependent discovery.
//!
//! Two engines answer the same question ("which repositories depend on this
//! module?") over different substrates:
//!
//! - [`LocalDiscovery`] scans a directory of checked-out repositories and
//!   asks the `go` toolchain, falling back to parsing `go.mod` directly.
//! - [`RemoteDiscovery`] searches a GitHub organization's code index and
//!   reads `go.mod` files through the API.
//!
//! Both probe their candidates with the same collect-or-skip fold: every
//! candidate yields a [`ProbeOutcome`], failures are logged and skipped, and
//! results keep candidate order.

pub mod filter;
pub mod local;
pub mod probe;
pub mod remote;
pub mod scan;
pub mod search;

use rayon::prelude::*;
use thiserror::Error;

use crate::core::dependent::DependentDescriptor;
use crate::core::request::{DiscoveryRequest, RequestError};
use crate::hosting::ProviderError;
use crate::resolver::version;
use crate::util::cancel::{is_cancellation, CancelToken, Cancelled};

pub use filter::{NameFilter, NamePattern, PathFilter};
pub use local::LocalDiscovery;
pub use probe::LocalProber;
pub use remote::{RemoteDiscovery, RemoteProber};
pub use scan::scan_modules;
pub use search::RepositorySearch;

/// Why a discovery run failed as a whole.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error(transparent)]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for DiscoveryError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Cancelled>() {
            Ok(cancelled) => DiscoveryError::Cancelled(cancelled),
            Err(err) => DiscoveryError::Other(err),
        }
    }
}

/// Finds the dependents of a module.
pub trait Discovery {
    fn discover(
        &self,
        request: &DiscoveryRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<DependentDescriptor>, DiscoveryError>;
}

/// The available discovery engines.
pub enum DiscoveryEngine {
    Local(LocalDiscovery),
    Remote(RemoteDiscovery),
}

impl Discovery for DiscoveryEngine {
    fn discover(
        &self,
        request: &DiscoveryRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<DependentDescriptor>, DiscoveryError> {
        match self {
            DiscoveryEngine::Local(engine) => engine.discover(request, cancel),
            DiscoveryEngine::Remote(engine) => engine.discover(request, cancel),
        }
    }
}

/// Result of probing one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Match(DependentDescriptor),
    NoMatch,
    /// The candidate could not be evaluated
    Failed(String),
}

impl ProbeOutcome {
    /// Turn a probe error into [`ProbeOutcome::Failed`], naming the candidate.
    pub fn failed(candidate: impl std::fmt::Display, err: &anyhow::Error) -> Self {
        if is_cancellation(err) {
            return ProbeOutcome::Failed(format!("{}: cancelled", candidate));
        }
        ProbeOutcome::Failed(format!("{}: {:#}", candidate, err))
    }
}

/// Probe every candidate, one outcome per candidate in candidate order.
///
/// With `jobs > 1` the probes run on a dedicated pool of `jobs` threads. A
/// failed probe never stops its siblings. Cancellation is reported after
/// the fold.
pub fn probe_all<C, F>(
    candidates: &[C],
    jobs: usize,
    cancel: &CancelToken,
    probe: F,
) -> Result<Vec<ProbeOutcome>, Cancelled>
where
    C: Sync,
    F: Fn(&C) -> ProbeOutcome + Sync + Send,
{
    let guarded = |candidate: &C| {
        if cancel.is_cancelled() {
            return ProbeOutcome::Failed("cancelled".to_string());
        }
        probe(candidate)
    };

    let outcomes: Vec<ProbeOutcome> = if jobs > 1 && candidates.len() > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| candidates.par_iter().map(guarded).collect()),
            Err(e) => {
                tracing::warn!("failed to start probe pool, probing sequentially: {}", e);
                candidates.iter().map(guarded).collect()
            }
        }
    } else {
        candidates.iter().map(guarded).collect()
    };

    cancel.check()?;
    Ok(outcomes)
}

/// Keep the matches, logging the failures.
pub fn collect_matches(outcomes: Vec<ProbeOutcome>) -> Vec<DependentDescriptor> {
    let mut matches = Vec::new();
    for outcome in outcomes {
        match outcome {
            ProbeOutcome::Match(dependent) => matches.push(dependent),
            ProbeOutcome::NoMatch => {}
            ProbeOutcome::Failed(reason) => tracing::debug!("skipping {}", reason),
        }
    }
    matches
}

/// Whether a dependent pinned at `current` still needs `target_version`.
///
/// Without a target version everything qualifies. A missing or non-semver
/// pin also qualifies, since it cannot be shown to be up to date.
pub fn is_outdated(current: Option<&str>, target_version: Option<&str>) -> bool {
    let Some(target) = target_version else {
        return true;
    };
    match current {
        Some(current) => version::is_older(current, target).unwrap_or(true),
        None => true,
    }
}

/// Apply the request's target-version filter and result cap.
pub fn finish(mut dependents: Vec<DependentDescriptor>, request: &DiscoveryRequest) -> Vec<DependentDescriptor> {
    let target_version = request.target_version.as_deref();
    dependents.retain(|d| {
        let keep = is_outdated(d.current_version.as_deref(), target_version);
        if !keep {
            tracing::debug!(
                "{} already at {}",
                d.module,
                d.current_version.as_deref().unwrap_or("?")
            );
        }
        keep
    });
    if let Some(limit) = request.limit {
        dependents.truncate(limit);
    }
    dependents
}
