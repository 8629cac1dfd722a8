//! Test utilities and mocks for modfleet unit tests.
//!
//! Mocks stand in for the two external substrates: the `go` binary (through
//! [`MockExecutor`]) and the hosting provider (through [`MockHostingApi`] and
//! [`MockRefLister`]). Workspace fixtures live in [`fixtures`].
//!
//! # Example
//!
//! ```rust,ignore
//! use modfleet::test_support::{MockExecutor, MockProcessOutput};
//!
//! #[test]
//! fn test_example() {
//!     let mut exec = MockExecutor::new();
//!     exec.expect("go list -m all", MockProcessOutput::success("example.com/a\n"));
//!
//!     // Hand `Arc::new(exec)` to a GoToolchain...
//! }
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use chrono::{Duration, Utc};

use crate::hosting::{CodeHit, HostingApi, ProviderError, RateLimit, RepoRef, SearchPage};
use crate::sources::git::RefLister;
use crate::util::cancel::CancelToken;
use crate::util::process::{Executor, ProcessBuilder, ProcessOutput};

pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl MockProcessOutput {
    /// A successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    fn to_output(&self) -> ProcessOutput {
        ProcessOutput {
            status: Some(self.status),
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Pattern for matching commands in MockExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Any => true,
        }
    }
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    pub pattern: CommandPattern,
    pub output: MockProcessOutput,
    /// Number of times this expectation can be used (None = unlimited).
    pub times: Option<usize>,
    pub used: usize,
}

impl CommandExpectation {
    pub fn new(pattern: CommandPattern, output: MockProcessOutput) -> Self {
        CommandExpectation {
            pattern,
            output,
            times: None,
            used: 0,
        }
    }

    /// Set the number of times this expectation can be used.
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    fn available(&self) -> bool {
        match self.times {
            Some(n) => self.used < n,
            None => true,
        }
    }
}

#[derive(Debug, Default)]
struct ExecutorState {
    expectations: Vec<CommandExpectation>,
    calls: Vec<ProcessBuilder>,
}

/// Mock process executor.
///
/// Commands are matched by their displayed form (`go list -m all`), first
/// matching expectation wins. Unmatched commands use the default output, or
/// fail when none is set.
#[derive(Debug, Default)]
pub struct MockExecutor {
    state: Mutex<ExecutorState>,
    default_output: Option<MockProcessOutput>,
}

impl MockExecutor {
    pub fn new() -> Self {
        MockExecutor::default()
    }

    fn push(&mut self, expectation: CommandExpectation) -> &mut Self {
        if let Ok(state) = self.state.get_mut() {
            state.expectations.push(expectation);
        }
        self
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&mut self, cmd: &str, output: MockProcessOutput) -> &mut Self {
        self.push(CommandExpectation::new(
            CommandPattern::Exact(cmd.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&mut self, prefix: &str, output: MockProcessOutput) -> &mut Self {
        self.push(CommandExpectation::new(
            CommandPattern::StartsWith(prefix.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&mut self, substring: &str, output: MockProcessOutput) -> &mut Self {
        self.push(CommandExpectation::new(
            CommandPattern::Contains(substring.to_string()),
            output,
        ))
    }

    /// Add a custom expectation.
    pub fn expect_pattern(&mut self, expectation: CommandExpectation) -> &mut Self {
        self.push(expectation)
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&mut self, output: MockProcessOutput) -> &mut Self {
        self.default_output = Some(output);
        self
    }

    /// All commands run so far, as displayed.
    pub fn calls(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.calls.iter().map(|c| c.display_command()).collect())
            .unwrap_or_default()
    }

    /// The most recent command, with its environment and working directory.
    pub fn last_command(&self) -> Option<ProcessBuilder> {
        self.state.lock().ok().and_then(|s| s.calls.last().cloned())
    }

    /// Verify that all expectations with a specific count were satisfied.
    pub fn verify(&self) -> Result<()> {
        let state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => bail!("mock executor lock poisoned"),
        };
        for (i, exp) in state.expectations.iter().enumerate() {
            if let Some(expected) = exp.times {
                if exp.used != expected {
                    bail!(
                        "expectation {} was used {} times, expected {}",
                        i,
                        exp.used,
                        expected
                    );
                }
            }
        }
        Ok(())
    }
}

impl Executor for MockExecutor {
    fn exec(&self, cmd: &ProcessBuilder, cancel: &CancelToken) -> Result<ProcessOutput> {
        cancel.check()?;

        let full_cmd = cmd.display_command();
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => bail!("mock executor lock poisoned"),
        };
        state.calls.push(cmd.clone());

        for exp in &mut state.expectations {
            if exp.pattern.matches(&full_cmd) && exp.available() {
                exp.used += 1;
                return Ok(exp.output.to_output());
            }
        }

        match self.default_output {
            Some(ref default) => Ok(default.to_output()),
            None => bail!("unexpected command: {}", full_cmd),
        }
    }
}

#[derive(Debug, Clone)]
struct MockFile {
    repo: RepoRef,
    path: String,
    /// `None` fails the fetch.
    content: Option<String>,
}

/// In-memory hosting provider.
///
/// Organization-wide searches return the registered pages in order.
/// Searches scoped with `repo:owner/name` return the files registered for
/// that repository.
#[derive(Debug)]
pub struct MockHostingApi {
    quota: RateLimit,
    pages: Vec<Vec<CodeHit>>,
    files: Vec<MockFile>,
    tags: HashMap<String, Vec<String>>,
    searches: Mutex<Vec<String>>,
    tag_calls: AtomicUsize,
}

impl Default for MockHostingApi {
    fn default() -> Self {
        MockHostingApi::new()
    }
}

impl MockHostingApi {
    /// A provider with a full 5000/5000 quota and nothing in it.
    pub fn new() -> Self {
        MockHostingApi {
            quota: RateLimit {
                limit: 5000,
                remaining: 5000,
                reset: Utc::now() + Duration::hours(1),
            },
            pages: Vec::new(),
            files: Vec::new(),
            tags: HashMap::new(),
            searches: Mutex::new(Vec::new()),
            tag_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_quota(mut self, remaining: u64, limit: u64) -> Self {
        self.quota.remaining = remaining;
        self.quota.limit = limit;
        self
    }

    /// Append one page of organization search results, `(owner, name, path)`.
    pub fn with_search_page(mut self, hits: &[(&str, &str, &str)]) -> Self {
        self.pages.push(
            hits.iter()
                .map(|&(owner, name, path)| CodeHit {
                    path: path.to_string(),
                    repository: repo(owner, name),
                })
                .collect(),
        );
        self
    }

    pub fn with_file(mut self, owner: &str, name: &str, path: &str, content: &str) -> Self {
        self.files.push(MockFile {
            repo: repo(owner, name),
            path: path.to_string(),
            content: Some(content.to_string()),
        });
        self
    }

    /// Register a file whose fetch fails with a server error.
    pub fn with_failing_file(mut self, owner: &str, name: &str, path: &str) -> Self {
        self.files.push(MockFile {
            repo: repo(owner, name),
            path: path.to_string(),
            content: None,
        });
        self
    }

    pub fn with_tags(mut self, owner: &str, name: &str, tags: &[&str]) -> Self {
        self.tags.insert(
            format!("{}/{}", owner, name),
            tags.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    /// Number of code searches issued.
    pub fn search_calls(&self) -> usize {
        self.searches.lock().map(|s| s.len()).unwrap_or_default()
    }

    /// Queries of the code searches issued.
    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn tag_calls(&self) -> usize {
        self.tag_calls.load(Ordering::SeqCst)
    }
}

fn repo(owner: &str, name: &str) -> RepoRef {
    RepoRef::new(owner, name, format!("https://github.com/{}/{}", owner, name))
}

impl HostingApi for MockHostingApi {
    fn rate_limit(&self, cancel: &CancelToken) -> Result<RateLimit, ProviderError> {
        cancel.check()?;
        Ok(self.quota.clone())
    }

    fn search_code(
        &self,
        query: &str,
        page: u32,
        _per_page: u32,
        cancel: &CancelToken,
    ) -> Result<SearchPage<CodeHit>, ProviderError> {
        cancel.check()?;
        if let Ok(mut searches) = self.searches.lock() {
            searches.push(query.to_string());
        }

        let scoped = query
            .split_whitespace()
            .find_map(|token| token.strip_prefix("repo:"));
        if let Some(full_name) = scoped {
            let items: Vec<CodeHit> = self
                .files
                .iter()
                .filter(|f| f.repo.full_name() == full_name)
                .map(|f| CodeHit {
                    path: f.path.clone(),
                    repository: f.repo.clone(),
                })
                .collect();
            return Ok(SearchPage {
                total_count: items.len() as u64,
                items,
                next_page: None,
            });
        }

        let index = page.saturating_sub(1) as usize;
        let items = self.pages.get(index).cloned().unwrap_or_default();
        let next_page = if index + 1 < self.pages.len() {
            Some(page + 1)
        } else {
            None
        };
        Ok(SearchPage {
            items,
            next_page,
            total_count: self.pages.iter().map(Vec::len).sum::<usize>() as u64,
        })
    }

    fn file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        cancel: &CancelToken,
    ) -> Result<String, ProviderError> {
        cancel.check()?;
        let file = self
            .files
            .iter()
            .find(|f| f.repo.full_name() == repo.full_name() && f.path == path);

        match file {
            Some(MockFile {
                content: Some(content),
                ..
            }) => Ok(content.clone()),
            Some(_) => Err(ProviderError::Http {
                status: 502,
                message: "Server Error".into(),
            }),
            None => Err(ProviderError::NotFound {
                resource: format!("repos/{}/contents/{}", repo.full_name(), path),
            }),
        }
    }

    fn list_tags(
        &self,
        owner: &str,
        name: &str,
        _per_page: u32,
        cancel: &CancelToken,
    ) -> Result<Vec<String>, ProviderError> {
        cancel.check()?;
        self.tag_calls.fetch_add(1, Ordering::SeqCst);
        let full_name = format!("{}/{}", owner, name);
        self.tags
            .get(&full_name)
            .cloned()
            .ok_or(ProviderError::NotFound {
                resource: format!("repos/{}/tags", full_name),
            })
    }

    fn web_host(&self) -> &str {
        "github.com"
    }
}

/// Remote ref listing with canned results.
#[derive(Debug, Default)]
pub struct MockRefLister {
    refs: Vec<String>,
    error: Option<String>,
    urls: Mutex<Vec<String>>,
}

impl MockRefLister {
    pub fn new(refs: &[&str]) -> Self {
        MockRefLister {
            refs: refs.iter().map(|r| r.to_string()).collect(),
            ..MockRefLister::default()
        }
    }

    /// A lister whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        MockRefLister {
            error: Some(message.to_string()),
            ..MockRefLister::default()
        }
    }

    /// URLs listed so far.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl RefLister for MockRefLister {
    fn list_refs(&self, url: &str, cancel: &CancelToken) -> Result<Vec<String>> {
        cancel.check()?;
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(url.to_string());
        }
        match self.error {
            Some(ref message) => bail!("{}", message),
            None => Ok(self.refs.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_executor_matches_in_order() {
        let mut exec = MockExecutor::new();
        exec.expect("go version", MockProcessOutput::success("go version go1.22.0"));
        exec.expect_prefix("go list", MockProcessOutput::success("listing"));

        let cancel = CancelToken::new();
        let out = exec
            .exec(&ProcessBuilder::new("go").arg("version"), &cancel)
            .unwrap();
        assert_eq!(out.stdout, "go version go1.22.0");

        let out = exec
            .exec(&ProcessBuilder::new("go").args(["list", "-m", "all"]), &cancel)
            .unwrap();
        assert_eq!(out.stdout, "listing");
        assert_eq!(exec.calls(), vec!["go version", "go list -m all"]);
    }

    #[test]
    fn test_mock_executor_unexpected() {
        let exec = MockExecutor::new();
        assert!(exec
            .exec(&ProcessBuilder::new("unknown"), &CancelToken::new())
            .is_err());
    }

    #[test]
    fn test_mock_executor_times() {
        let mut exec = MockExecutor::new();
        exec.expect_pattern(
            CommandExpectation::new(CommandPattern::Any, MockProcessOutput::success("")).times(1),
        );
        assert!(exec.verify().is_err());
        exec.exec(&ProcessBuilder::new("go"), &CancelToken::new()).unwrap();
        exec.verify().unwrap();
    }

    #[test]
    fn test_mock_hosting_pages() {
        let api = MockHostingApi::new()
            .with_search_page(&[("acme", "a", "go.mod")])
            .with_search_page(&[("acme", "b", "go.mod")]);
        let cancel = CancelToken::new();

        let first = api.search_code("org:acme", 1, 100, &cancel).unwrap();
        assert_eq!(first.next_page, Some(2));
        let second = api.search_code("org:acme", 2, 100, &cancel).unwrap();
        assert_eq!(second.next_page, None);
        assert_eq!(second.items[0].repository.name, "b");
        assert_eq!(api.search_calls(), 2);
    }

    #[test]
    fn test_mock_ref_lister_failure() {
        let refs = MockRefLister::failing("connection refused");
        let err = refs.list_refs("https://x/y.git", &CancelToken::new()).unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(refs.urls(), vec!["https://x/y.git"]);
    }
}
