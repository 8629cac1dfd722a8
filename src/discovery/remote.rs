//! Discovery across a GitHub organization.

use std::sync::Arc;

use crate::core::dependent::DependentDescriptor;
use crate::core::module::clone_url;
use crate::core::request::{DiscoveryRequest, DiscoveryScope, RequestError};
use crate::discovery::filter::NameFilter;
use crate::discovery::search::{RepositorySearch, SEARCH_PAGE_SIZE};
use crate::discovery::{collect_matches, finish, probe_all, Discovery, DiscoveryError, ProbeOutcome};
use crate::hosting::{HostingApi, ProviderError, RepoRef};
use crate::modfile::{self, ModFile};
use crate::util::cancel::CancelToken;

/// Checks one repository's `go.mod` files for a reference to the target.
pub struct RemoteProber {
    api: Arc<dyn HostingApi>,
}

impl RemoteProber {
    pub fn new(api: Arc<dyn HostingApi>) -> Self {
        RemoteProber { api }
    }

    /// Probe one repository.
    ///
    /// The first `go.mod` that references the target decides the match. A
    /// file that cannot be fetched is skipped.
    pub fn probe(&self, repo: &RepoRef, target: &str, cancel: &CancelToken) -> ProbeOutcome {
        let query = format!("filename:{} repo:{}", modfile::FILE_NAME, repo.full_name());
        let hits = match self.api.search_code(&query, 1, SEARCH_PAGE_SIZE, cancel) {
            Ok(page) => page.items,
            Err(e) => return ProbeOutcome::Failed(format!("{}: {}", repo.full_name(), e)),
        };

        for hit in hits {
            if file_name(&hit.path) != modfile::FILE_NAME {
                continue;
            }

            let content = match self.api.file_content(repo, &hit.path, cancel) {
                Ok(content) => content,
                Err(ProviderError::Cancelled(_)) => {
                    return ProbeOutcome::Failed(format!("{}: cancelled", repo.full_name()))
                }
                Err(e) => {
                    tracing::debug!("skipping {}/{}: {}", repo.full_name(), hit.path, e);
                    continue;
                }
            };

            if let Some(dependent) = self.check_content(repo, &hit.path, &content, target) {
                return ProbeOutcome::Match(dependent);
            }
        }

        ProbeOutcome::NoMatch
    }

    fn check_content(
        &self,
        repo: &RepoRef,
        path: &str,
        content: &str,
        target: &str,
    ) -> Option<DependentDescriptor> {
        if !mentions(content, target) {
            return None;
        }

        // Prefer the parsed file; fall back to the text match alone.
        let parsed = ModFile::parse(content).ok();
        if let Some(ref parsed) = parsed {
            if parsed.module_path() == Some(target) || !parsed.depends_on(target) {
                return None;
            }
        }

        let repository = repo.repository(self.api.web_host());
        let module = parsed
            .as_ref()
            .and_then(|p| p.module_path().map(str::to_string))
            .unwrap_or_else(|| repository.clone());
        let version = parsed.as_ref().and_then(|p| p.effective_version(target));

        Some(DependentDescriptor {
            clone_url: clone_url(&repository),
            module_path: module_dir(path),
            repository,
            module,
            ..DependentDescriptor::from_module(String::new())
        }
        .with_current_version(version))
    }
}

/// Whether any token outside the `module` directive and comments names the
/// target or one of its nested modules.
fn mentions(content: &str, target: &str) -> bool {
    content
        .lines()
        .map(|line| line.split("//").next().unwrap_or(line))
        .filter(|line| !line.trim_start().starts_with("module"))
        .flat_map(str::split_whitespace)
        .map(|token| token.trim_matches('"'))
        .any(|token| modfile::is_path_prefix(target, token))
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Directory of a `go.mod` inside its repository, `"."` at the root.
fn module_dir(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => ".".to_string(),
    }
}

/// Searches an organization and probes every repository found.
pub struct RemoteDiscovery {
    api: Arc<dyn HostingApi>,
    prober: RemoteProber,
    jobs: usize,
}

impl RemoteDiscovery {
    pub fn new(api: Arc<dyn HostingApi>) -> Self {
        RemoteDiscovery {
            prober: RemoteProber::new(api.clone()),
            api,
            jobs: 1,
        }
    }

    /// Probe up to `jobs` repositories at once.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

impl Discovery for RemoteDiscovery {
    fn discover(
        &self,
        request: &DiscoveryRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<DependentDescriptor>, DiscoveryError> {
        request.validate()?;
        let DiscoveryScope::Organization(ref org) = request.scope else {
            return Err(RequestError::ScopeMismatch {
                engine: "remote",
                scope: "a local workspace",
            }
            .into());
        };

        let filter = NameFilter::new(&request.include, &request.exclude);
        let repos = RepositorySearch::new(self.api.as_ref()).search(
            org,
            request.query.as_deref(),
            &filter,
            request.limit,
            cancel,
        )?;

        let target = request.target.as_str();
        let outcomes = probe_all(&repos, self.jobs, cancel, |repo| {
            self.prober.probe(repo, target, cancel)
        })?;

        let dependents = finish(collect_matches(outcomes), request);
        tracing::info!("{} repositories in {} depend on {}", dependents.len(), org, target);
        Ok(dependents)
    }
}
