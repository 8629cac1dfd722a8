//! Repository search within a GitHub organization.

use std::collections::HashSet;

use crate::discovery::filter::NameFilter;
use crate::hosting::{HostingApi, ProviderError, RateLimit, RepoRef};
use crate::modfile;
use crate::util::cancel::CancelToken;

/// Results requested per search page (the API maximum).
pub const SEARCH_PAGE_SIZE: u32 = 100;

/// Search query scoped to `org`.
///
/// A raw query is used verbatim; otherwise the query looks for Go module
/// files.
pub fn build_query(org: &str, raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|q| !q.is_empty()) {
        Some(raw) => format!("{} org:{}", raw, org),
        None => format!("filename:{} language:go org:{}", modfile::FILE_NAME, org),
    }
}

/// Paginated repository search with a rate-limit preflight.
pub struct RepositorySearch<'a> {
    api: &'a dyn HostingApi,
}

impl<'a> RepositorySearch<'a> {
    pub fn new(api: &'a dyn HostingApi) -> Self {
        RepositorySearch { api }
    }

    /// Fail fast when the remaining quota is critically low.
    pub fn preflight(&self, cancel: &CancelToken) -> Result<RateLimit, ProviderError> {
        let quota = self.api.rate_limit(cancel)?;
        tracing::debug!(
            "GitHub quota: {}/{} remaining",
            quota.remaining,
            quota.limit
        );
        ProviderError::check_quota(&quota)?;
        Ok(quota)
    }

    /// Repositories in `org` matching the query and the name filter.
    ///
    /// Pages are fetched until the provider reports no next page or `limit`
    /// repositories were collected. Repositories appear once, in the order
    /// the provider first returned them.
    pub fn search(
        &self,
        org: &str,
        raw_query: Option<&str>,
        filter: &NameFilter,
        limit: Option<usize>,
        cancel: &CancelToken,
    ) -> Result<Vec<RepoRef>, ProviderError> {
        self.preflight(cancel)?;

        let query = build_query(org, raw_query);
        let mut seen = HashSet::new();
        let mut repos = Vec::new();
        let mut page = 1;

        loop {
            cancel.check()?;
            let results = self.api.search_code(&query, page, SEARCH_PAGE_SIZE, cancel)?;

            for hit in results.items {
                let repo = hit.repository;
                if !seen.insert(repo.full_name()) {
                    continue;
                }
                if filter.matches(&repo.name) {
                    repos.push(repo);
                } else {
                    tracing::debug!("{} filtered out", repo.full_name());
                }
            }

            if limit.is_some_and(|cap| repos.len() >= cap) {
                break;
            }
            match results.next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        if let Some(cap) = limit {
            repos.truncate(cap);
        }
        tracing::info!("{} repositories matched `{}`", repos.len(), query);
        Ok(repos)
    }
}
