//! Discovery requests.

use std::path::PathBuf;

use thiserror::Error;

use crate::resolver::version;

/// Where to look for dependents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryScope {
    /// A local directory tree of checked-out repositories
    Workspace(PathBuf),
    /// A GitHub organization
    Organization(String),
}

/// Invalid discovery input. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("target module is required")]
    MissingTarget,

    #[error("workspace root is required")]
    MissingRoot,

    #[error("organization is required")]
    MissingOrganization,

    #[error("invalid glob pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("target version `{0}` is not a valid semantic version")]
    InvalidVersion(String),

    #[error("result limit must be greater than zero")]
    ZeroLimit,

    #[error("{engine} discovery cannot search {scope}")]
    ScopeMismatch {
        engine: &'static str,
        scope: &'static str,
    },
}

/// Immutable input to a discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRequest {
    pub scope: DiscoveryScope,

    /// Module path whose dependents are wanted
    pub target: String,

    /// Only return dependents pinned strictly below this version
    pub target_version: Option<String>,

    /// Maximum directory depth for workspace scans
    pub max_depth: Option<usize>,

    /// Include patterns (paths for workspaces, repository names for organizations)
    pub include: Vec<String>,

    /// Exclude patterns, winning over include
    pub exclude: Vec<String>,

    /// Result cap
    pub limit: Option<usize>,

    /// Raw search query for organization discovery
    pub query: Option<String>,
}

impl DiscoveryRequest {
    /// Request dependents of `target` under a local workspace root.
    pub fn workspace(root: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self::new(DiscoveryScope::Workspace(root.into()), target)
    }

    /// Request dependents of `target` within a GitHub organization.
    pub fn organization(org: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(DiscoveryScope::Organization(org.into()), target)
    }

    fn new(scope: DiscoveryScope, target: impl Into<String>) -> Self {
        DiscoveryRequest {
            scope,
            target: target.into(),
            target_version: None,
            max_depth: None,
            include: Vec::new(),
            exclude: Vec::new(),
            limit: None,
            query: None,
        }
    }

    pub fn with_target_version(mut self, version: impl Into<String>) -> Self {
        self.target_version = Some(version.into());
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_include(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_exclude(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.target.trim().is_empty() {
            return Err(RequestError::MissingTarget);
        }
        match self.scope {
            DiscoveryScope::Workspace(ref root) if root.as_os_str().is_empty() => {
                return Err(RequestError::MissingRoot);
            }
            DiscoveryScope::Organization(ref org) if org.trim().is_empty() => {
                return Err(RequestError::MissingOrganization);
            }
            _ => {}
        }
        if let Some(ref v) = self.target_version {
            if !version::is_valid(v) {
                return Err(RequestError::InvalidVersion(v.clone()));
            }
        }
        if self.limit == Some(0) {
            return Err(RequestError::ZeroLimit);
        }
        Ok(())
    }
}
