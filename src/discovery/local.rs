//! Discovery over a local workspace.

use crate::core::dependent::DependentDescriptor;
use crate::core::request::{DiscoveryRequest, DiscoveryScope, RequestError};
use crate::discovery::filter::PathFilter;
use crate::discovery::probe::LocalProber;
use crate::discovery::scan::scan_modules;
use crate::discovery::{collect_matches, finish, probe_all, Discovery, DiscoveryError};
use crate::util::cancel::CancelToken;

/// Scans a directory tree and probes every module found.
pub struct LocalDiscovery {
    prober: LocalProber,
    jobs: usize,
}

impl LocalDiscovery {
    pub fn new(prober: LocalProber) -> Self {
        LocalDiscovery { prober, jobs: 1 }
    }

    /// Probe up to `jobs` modules at once.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

impl Discovery for LocalDiscovery {
    fn discover(
        &self,
        request: &DiscoveryRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<DependentDescriptor>, DiscoveryError> {
        request.validate()?;
        let DiscoveryScope::Workspace(ref root) = request.scope else {
            return Err(RequestError::ScopeMismatch {
                engine: "local",
                scope: "an organization",
            }
            .into());
        };

        let filter = PathFilter::new(&request.include, &request.exclude)?;
        let modules = scan_modules(root, request.max_depth, &filter, cancel)?;
        tracing::info!("found {} modules under {}", modules.len(), root.display());

        let target = request.target.as_str();
        let outcomes = probe_all(&modules, self.jobs, cancel, |module| {
            self.prober.probe(module, target, cancel)
        })?;

        let dependents = finish(collect_matches(outcomes), request);
        tracing::info!("{} modules depend on {}", dependents.len(), target);
        Ok(dependents)
    }
}
