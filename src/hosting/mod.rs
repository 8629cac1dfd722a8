//! Hosting provider access.
//!
//! Remote discovery and tag-based version resolution talk to the hosting
//! provider through [`HostingApi`]. [`GitHubClient`] is the real
//! implementation; tests substitute a mock.

pub mod errors;
pub mod github;

use chrono::{DateTime, Utc};

use crate::util::cancel::CancelToken;

pub use errors::{classify, ProviderError, RATE_LIMIT_CRITICAL_RATIO};
pub use github::GitHubClient;

/// Default GitHub REST API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Core API quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: DateTime<Utc>,
}

impl RateLimit {
    /// Whether the remaining quota is below the critical share of the limit.
    pub fn is_critical(&self) -> bool {
        (self.remaining as f64) < (self.limit as f64) * RATE_LIMIT_CRITICAL_RATIO
    }
}

/// A repository as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
    /// Web URL, e.g. `https://github.com/acme/api`
    pub html_url: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, html_url: impl Into<String>) -> Self {
        RepoRef {
            owner: owner.into(),
            name: name.into(),
            html_url: html_url.into(),
        }
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// `host/owner/name`, taking the host from the web URL when possible.
    pub fn repository(&self, fallback_host: &str) -> String {
        let host = url::Url::parse(&self.html_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| fallback_host.to_string());
        format!("{}/{}/{}", host, self.owner, self.name)
    }
}

/// A file matched by code search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeHit {
    /// Path of the file inside the repository
    pub path: String,
    pub repository: RepoRef,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    /// Page number of the next page, if the provider reported one
    pub next_page: Option<u32>,
    pub total_count: u64,
}

/// The hosting provider endpoints used by modfleet.
pub trait HostingApi: Send + Sync {
    /// Current core API quota.
    fn rate_limit(&self, cancel: &CancelToken) -> Result<RateLimit, ProviderError>;

    /// One page of code search results. Pages start at 1.
    fn search_code(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
        cancel: &CancelToken,
    ) -> Result<SearchPage<CodeHit>, ProviderError>;

    /// Decoded content of a file.
    fn file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        cancel: &CancelToken,
    ) -> Result<String, ProviderError>;

    /// Tag names of a repository, newest first as the provider reports them.
    fn list_tags(
        &self,
        owner: &str,
        name: &str,
        per_page: u32,
        cancel: &CancelToken,
    ) -> Result<Vec<String>, ProviderError>;

    /// Host name of the provider's web UI, e.g. `github.com`.
    fn web_host(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_uses_html_host() {
        let repo = RepoRef::new("acme", "api", "https://ghe.acme.dev/acme/api");
        assert_eq!(repo.repository("github.com"), "ghe.acme.dev/acme/api");
        assert_eq!(repo.full_name(), "acme/api");
    }

    #[test]
    fn test_repository_falls_back_to_web_host() {
        let repo = RepoRef::new("acme", "api", "");
        assert_eq!(repo.repository("github.com"), "github.com/acme/api");
    }
}
