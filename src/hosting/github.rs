//! GitHub REST API client.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use chrono::DateTime;
use regex::Regex;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, LINK};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::hosting::{
    classify, CodeHit, HostingApi, ProviderError, RateLimit, RepoRef, SearchPage, DEFAULT_API_URL,
};
use crate::util::cancel::{CancelToken, Cancelled};
use crate::util::config::Credential;

/// Request timeout when the caller sets no deadline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

static NEXT_LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).ok());

/// Blocking GitHub client. The credential is fixed at construction.
pub struct GitHubClient {
    client: Client,
    api_url: String,
    web_host: String,
    credential: Option<Credential>,
}

impl GitHubClient {
    /// Create a client for `api_url` (public GitHub or an enterprise base).
    pub fn new(api_url: &str, credential: Option<Credential>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("modfleet/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        let api_url = api_url.trim_end_matches('/').to_string();
        let web_host = web_host_for(&api_url)
            .with_context(|| format!("invalid GitHub API URL: {}", api_url))?;

        if let Some(ref cred) = credential {
            tracing::debug!("using GitHub token from {}", cred.source());
        }

        Ok(GitHubClient {
            client,
            api_url,
            web_host,
            credential,
        })
    }

    /// Client for public GitHub.
    pub fn public(credential: Option<Credential>) -> Result<Self> {
        Self::new(DEFAULT_API_URL, credential)
    }

    fn request(&self, path: &str, cancel: &CancelToken) -> RequestBuilder {
        let mut req = self
            .client
            .get(format!("{}/{}", self.api_url, path.trim_start_matches('/')))
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .timeout(cancel.remaining().unwrap_or(DEFAULT_TIMEOUT));

        if let Some(ref cred) = self.credential {
            req = req.header(AUTHORIZATION, format!("Bearer {}", cred.token()));
        }
        req
    }

    /// Send a request, turning failures into classified provider errors.
    fn send(
        &self,
        req: RequestBuilder,
        resource: &str,
        cancel: &CancelToken,
    ) -> Result<Response, ProviderError> {
        cancel.check()?;

        let response = match req.send() {
            Ok(response) => response,
            Err(e) => {
                cancel.check()?;
                if e.is_timeout() && cancel.remaining().is_some() {
                    return Err(Cancelled::DeadlineExceeded.into());
                }
                return Err(classify(None, &e.to_string(), resource, || None));
            }
        };

        // The flag may have been raised while the request was in flight.
        cancel.check()?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

        Err(classify(Some(status.as_u16()), &message, resource, || {
            self.fetch_rate_limit(cancel).ok()
        }))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        resource: &str,
        cancel: &CancelToken,
    ) -> Result<T, ProviderError> {
        let response = self.send(req, resource, cancel)?;
        response.json::<T>().map_err(|e| ProviderError::Transport {
            message: format!("invalid response from {}: {}", resource, e),
        })
    }

    /// Quota lookup without classification, used while classifying.
    fn fetch_rate_limit(&self, cancel: &CancelToken) -> Result<RateLimit, ProviderError> {
        cancel.check()?;
        let response = self
            .request("rate_limit", cancel)
            .send()
            .map_err(|e| ProviderError::Transport {
                message: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(ProviderError::Http {
                status: response.status().as_u16(),
                message: "rate limit lookup failed".to_string(),
            });
        }
        let payload: RateLimitResponse =
            response.json().map_err(|e| ProviderError::Transport {
                message: e.to_string(),
            })?;
        payload.core()
    }
}

impl HostingApi for GitHubClient {
    fn rate_limit(&self, cancel: &CancelToken) -> Result<RateLimit, ProviderError> {
        let payload: RateLimitResponse =
            self.get_json(self.request("rate_limit", cancel), "rate_limit", cancel)?;
        payload.core()
    }

    fn search_code(
        &self,
        query: &str,
        page: u32,
        per_page: u32,
        cancel: &CancelToken,
    ) -> Result<SearchPage<CodeHit>, ProviderError> {
        tracing::debug!("code search `{}` page {}", query, page);

        let req = self.request("search/code", cancel).query(&[
            ("q", query.to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ]);
        let response = self.send(req, "search/code", cancel)?;

        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_from_link);

        let payload: CodeSearchResponse = response.json().map_err(|e| ProviderError::Transport {
            message: format!("invalid code search response: {}", e),
        })?;

        Ok(SearchPage {
            items: payload.items.into_iter().map(CodeItem::into_hit).collect(),
            next_page,
            total_count: payload.total_count,
        })
    }

    fn file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        cancel: &CancelToken,
    ) -> Result<String, ProviderError> {
        let resource = format!("repos/{}/contents/{}", repo.full_name(), path);
        let payload: ContentResponse =
            self.get_json(self.request(&resource, cancel), &resource, cancel)?;
        payload.decode().map_err(|message| ProviderError::Transport {
            message: format!("{}: {}", resource, message),
        })
    }

    fn list_tags(
        &self,
        owner: &str,
        name: &str,
        per_page: u32,
        cancel: &CancelToken,
    ) -> Result<Vec<String>, ProviderError> {
        let resource = format!("repos/{}/{}/tags", owner, name);
        let req = self
            .request(&resource, cancel)
            .query(&[("per_page", per_page.to_string())]);
        let tags: Vec<TagItem> = self.get_json(req, &resource, cancel)?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    fn web_host(&self) -> &str {
        &self.web_host
    }
}

/// `api.github.com` serves `github.com`; enterprise APIs live on the web host.
fn web_host_for(api_url: &str) -> Option<String> {
    let url = url::Url::parse(api_url).ok()?;
    let host = url.host_str()?;
    Some(match host.strip_prefix("api.") {
        Some(web) => web.to_string(),
        None => host.to_string(),
    })
}

/// Page number of the `rel="next"` link, if any.
fn next_page_from_link(header: &str) -> Option<u32> {
    let captures = NEXT_LINK.as_ref()?.captures(header)?;
    let url = url::Url::parse(captures.get(1)?.as_str()).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}

fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.message)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    core: RateLimitEntry,
}

#[derive(Debug, Deserialize)]
struct RateLimitEntry {
    limit: u64,
    remaining: u64,
    reset: i64,
}

impl RateLimitResponse {
    fn core(self) -> Result<RateLimit, ProviderError> {
        let core = self.resources.core;
        let reset = DateTime::from_timestamp(core.reset, 0).ok_or_else(|| {
            ProviderError::Transport {
                message: format!("invalid rate limit reset timestamp {}", core.reset),
            }
        })?;
        Ok(RateLimit {
            limit: core.limit,
            remaining: core.remaining,
            reset,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CodeSearchResponse {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    items: Vec<CodeItem>,
}

#[derive(Debug, Deserialize)]
struct CodeItem {
    path: String,
    repository: RepositoryItem,
}

#[derive(Debug, Deserialize)]
struct RepositoryItem {
    name: String,
    owner: OwnerItem,
    #[serde(default)]
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct OwnerItem {
    login: String,
}

impl CodeItem {
    fn into_hit(self) -> CodeHit {
        CodeHit {
            path: self.path,
            repository: RepoRef::new(
                self.repository.owner.login,
                self.repository.name,
                self.repository.html_url,
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

impl ContentResponse {
    fn decode(self) -> Result<String, String> {
        match self.encoding.as_str() {
            "base64" => {
                let compact: String = self.content.split_whitespace().collect();
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(compact)
                    .map_err(|e| format!("invalid base64 content: {}", e))?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            "" | "utf-8" => Ok(self.content),
            other => Err(format!("unsupported content encoding `{}`", other)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TagItem {
    name: String,
}
